//! Centralized, non-configurable filesystem paths for upnotify
//!
//! The reboot marker is written by package maintainer scripts; its existence
//! is the whole signal.

pub const REBOOT_REQUIRED: &str = "/var/run/reboot-required";

pub const SYSTEM_CONFIG: &str = "/etc/upnotify/config.toml";

pub const HELPER_PATH: &str = "/usr/lib/upnotify/upnotify-upgrader";

pub const LOGS_DIR: &str = "/var/log/upnotify";

pub const OS_RELEASE: &str = "/etc/os-release";

/// Upgrader path value that selects the interactive terminal flow
pub const TERMINAL_SENTINEL: &str = "terminal";
