//! upnotify - Update notifier for apt based distributions
//!
//! Shows the pending upgrades, asks whether to apply them and follows the
//! privileged upgrade to the end.

mod cli;
mod display;
mod error;
mod logging;

use std::process;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tracing::{error, info, warn};
use upnotify_cache::AptSimulator;
use upnotify_config::{fixed_paths, Config};
use upnotify_net::{MetaReleaseClient, NetClient, NetConfig, FALLBACK_RELEASE_TEXT};
use upnotify_ops::Invocation;
use upnotify_platform::{LinuxProcessOperations, MarkerFileProbe, RebootProbe};
use upnotify_session::{Reporter, Session, SessionMachine, SessionParams, UserCommand};
use upnotify_types::OutputFormat;

use crate::cli::Cli;
use crate::display::{ConsoleReporter, JsonReporter};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(e.exit_code());
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    // Configuration precedence: file (or defaults), environment, CLI flags
    let mut config = Config::load_or_default(cli.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli);

    let json_mode = cli.json || config.general.default_output == OutputFormat::Json;
    logging::init_tracing(json_mode, cli.debug, &config.log_dir());
    info!("Starting upnotify v{}", env!("CARGO_PKG_VERSION"));

    let probe = Arc::new(MarkerFileProbe::new(config.reboot_marker()));
    if cli.upgrades == 0 && !cli.release_upgrade && !probe.is_reboot_required() {
        info!("no upgrades, no release upgrade and no reboot pending");
        return Ok(());
    }

    let release_text = if cli.release_upgrade {
        Some(describe_release(&config, cli.release_version.as_deref()).await)
    } else {
        None
    };

    let invocation = cli
        .upgrader
        .as_deref()
        .map(|upgrader| Invocation::for_upgrader(upgrader, &config.upgrade));
    let params = SessionParams {
        upgrades: cli.upgrades,
        security_upgrades: cli.security_upgrades,
        release_upgrade: cli.release_upgrade,
        release_text,
        can_apply: invocation.is_some(),
        cache_update: config.upgrade.cache_update,
        safe: config.upgrade.safe_mode,
    };
    // Without an upgrader apply stays disabled and nothing is ever launched
    let invocation = invocation.unwrap_or(Invocation::Direct);

    let snapshots = Arc::new(AptSimulator::new(
        Arc::new(LinuxProcessOperations::new()),
        fixed_paths::OS_RELEASE,
    ));
    let session = Session::new(
        SessionMachine::new(params, probe),
        snapshots,
        invocation.backend(),
        invocation,
    )
    .with_always_security(config.security.always_security.clone());

    let (command_tx, command_rx) = unbounded_channel();
    spawn_interrupt_handler(command_tx.clone());

    let outcome = if json_mode {
        let mut reporter = JsonReporter::new(command_tx, cli.yes);
        run_session(session, &mut reporter, command_rx).await?
    } else {
        let mut reporter = ConsoleReporter::new(command_tx, cli.yes, config.general.color);
        run_session(session, &mut reporter, command_rx).await?
    };

    info!(
        stage = %outcome.stage,
        errors = outcome.errors.len(),
        reboot_required = outcome.reboot_required,
        "session ended"
    );
    Ok(())
}

async fn run_session<R: Reporter>(
    session: Session,
    reporter: &mut R,
    commands: tokio::sync::mpsc::UnboundedReceiver<UserCommand>,
) -> Result<upnotify_session::SessionOutcome, CliError> {
    Ok(session.run(reporter, commands).await?)
}

/// Name the target release, falling back to a generic message
async fn describe_release(config: &Config, version: Option<&str>) -> String {
    match NetClient::new(NetConfig::from(&config.network)) {
        Ok(client) => {
            MetaReleaseClient::new(client, config.network.meta_release_url.clone())
                .describe_release(version)
                .await
        }
        Err(e) => {
            warn!(error = %e, "cannot create HTTP client");
            FALLBACK_RELEASE_TEXT.to_string()
        }
    }
}

/// Ctrl-C asks the session to cancel; the session decides whether it can
fn spawn_interrupt_handler(commands: UnboundedSender<UserCommand>) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            if commands.send(UserCommand::Cancel).is_err() {
                break;
            }
        }
    });
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, cli: &Cli) {
    if let Some(color) = cli.color {
        config.general.color = color;
    }
    if cli.json {
        config.general.default_output = OutputFormat::Json;
    }
    if cli.cache_update {
        config.upgrade.cache_update = true;
    }
    if cli.safe {
        config.upgrade.safe_mode = true;
    }
}
