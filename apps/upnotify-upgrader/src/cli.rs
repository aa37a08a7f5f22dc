//! Command line interface definition

use clap::{Parser, Subcommand};
use upnotify_types::OperationKind;

/// upnotify-upgrader - Privileged helper run by upnotify
///
/// Runs one package operation and writes its progress to stdout as JSON
/// lines. A `cancel` line on stdin asks the operation to stop.
#[derive(Parser, Debug)]
#[command(name = "upnotify-upgrader")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Privileged upgrade helper for upnotify")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log debug output to stderr
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Refresh the package lists
    #[command(name = "update-cache")]
    UpdateCache,

    /// Upgrade the installed packages
    Upgrade {
        /// Never remove or newly install packages
        #[arg(long)]
        safe: bool,
    },

    /// Upgrade to the next distribution release
    #[command(name = "release-upgrade")]
    ReleaseUpgrade,
}

impl Commands {
    pub fn kind(self) -> OperationKind {
        match self {
            Commands::UpdateCache => OperationKind::UpdateCache,
            Commands::Upgrade { safe } => OperationKind::SystemUpgrade { safe },
            Commands::ReleaseUpgrade => OperationKind::ReleaseUpgrade,
        }
    }
}
