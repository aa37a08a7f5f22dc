//! upnotify-upgrader - Privileged helper for the upnotify notifier
//!
//! Runs as root under the privilege wrapper. Stdout carries the event
//! stream only; diagnostics go to stderr.

mod cli;

use std::process;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use upnotify_errors::{Error, UserFacingError};
use upnotify_events::{wire, OperationEvent, RunnerId};
use upnotify_ops::{Invocation, OperationRunner};
use upnotify_platform::require_root;
use upnotify_types::{ExitState, OperationKind};

use crate::cli::Cli;

const ROOT_REQUIRED_TEXT: &str = "Please run this software with administrative rights.";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let kind = cli.command.kind();
    if let Err(e) = require_root(&kind.to_string()) {
        warn!(error = %e, "refusing to run without administrative rights");
        eprintln!("{ROOT_REQUIRED_TEXT}");
        if let Some(hint) = e.user_hint() {
            eprintln!("  Hint: {hint}");
        }
        process::exit(1);
    }

    match run(kind).await {
        Ok(exit) if exit.is_success() => process::exit(0),
        Ok(exit) => {
            info!(?exit, "operation did not succeed");
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Run `kind` with the package manager and stream its events to stdout
async fn run(kind: OperationKind) -> Result<ExitState, Error> {
    let invocation = Invocation::Direct;
    let (tx, mut events) = upnotify_events::channel();
    let runner = OperationRunner::new(invocation.backend(), tx);
    let handle = runner.spawn(RunnerId(1), invocation.request(kind));
    drop(runner);

    let mut stdout = tokio::io::stdout();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut exit = ExitState::Failed;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let line = wire::encode_line(&event.event)?;
                stdout.write_all(line.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
                if let OperationEvent::Finished { exit: state } = event.event {
                    exit = state;
                    break;
                }
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim() == "cancel" => handle.cancel(),
                Ok(Some(line)) => debug!(%line, "ignoring unknown request"),
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
        }
    }

    handle.join().await;
    Ok(exit)
}

/// Diagnostics only ever go to stderr
fn init_tracing(debug_flag: bool) {
    let default = if debug_flag { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}
