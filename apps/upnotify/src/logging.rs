//! Tracing subscriber setup

use std::path::Path;

use tracing_subscriber::EnvFilter;

const DEBUG_FILTER: &str = "info,upnotify=debug,upnotify_session=debug,upnotify_ops=debug";
const QUIET_FILTER: &str = "warn";

/// Initialize tracing/logging
///
/// Normal runs log warnings to stderr. `--debug` (or `RUST_LOG`) writes JSON
/// logs to a timestamped file under `log_dir`, falling back to stderr when
/// the file cannot be created. JSON output mode never logs to the console.
pub fn init_tracing(json_mode: bool, debug_flag: bool, log_dir: &Path) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_flag;

    if debug_enabled {
        match open_log_file(log_dir) {
            Ok((file, path)) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(filter_or(DEBUG_FILTER))
                    .init();
                if !json_mode {
                    eprintln!("Debug logging enabled: {}", path.display());
                }
                return;
            }
            Err(e) if !json_mode => {
                eprintln!("Warning: Failed to create log file: {e}");
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_env_filter(filter_or(DEBUG_FILTER))
                    .init();
                return;
            }
            Err(_) => {}
        }
    }

    if json_mode {
        // stdout carries the JSON views
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter_or(QUIET_FILTER))
            .init();
    }
}

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

fn open_log_file(log_dir: &Path) -> std::io::Result<(std::fs::File, std::path::PathBuf)> {
    std::fs::create_dir_all(log_dir)?;
    let path = log_dir.join(format!(
        "upnotify-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    let file = std::fs::File::create(&path)?;
    Ok((file, path))
}
