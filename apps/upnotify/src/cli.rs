//! Command line interface definition

use clap::Parser;
use std::path::PathBuf;
use upnotify_types::ColorChoice;

/// upnotify - Update notifier for apt based distributions
#[derive(Parser, Debug)]
#[command(name = "upnotify")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Update notifier for apt based distributions")]
#[command(long_about = None)]
pub struct Cli {
    /// How many upgrades are available
    #[arg(short = 'u', long = "upgrades", default_value_t = 0, value_name = "N")]
    pub upgrades: u32,

    /// How many security upgrades are available
    #[arg(short = 's', long = "security-upg", default_value_t = 0, value_name = "N")]
    pub security_upgrades: u32,

    /// Upgrader to run: a helper executable, or `terminal`
    #[arg(short = 'p', long = "upgrader-sw", value_name = "APP")]
    pub upgrader: Option<String>,

    /// A new distribution release is available
    #[arg(long)]
    pub release_upgrade: bool,

    /// Version of the new release, e.g. 24.04
    #[arg(long, value_name = "VERSION")]
    pub release_version: Option<String>,

    /// Refresh the package lists before upgrading
    #[arg(long)]
    pub cache_update: bool,

    /// Only upgrade, never remove or newly install packages
    #[arg(long)]
    pub safe: bool,

    /// Apply without asking
    #[arg(short = 'y', long = "yes")]
    pub yes: bool,

    /// Print every session view as a JSON line
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging to the log directory
    #[arg(long)]
    pub debug: bool,

    /// Color output control
    #[arg(long, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
