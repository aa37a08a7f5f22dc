#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for upnotify
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/upnotify/config.toml, then /etc/upnotify/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binaries)

mod constants;

pub mod fixed_paths {
    pub use crate::constants::*;
}

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use upnotify_errors::{ConfigError, Error};
use upnotify_types::{ColorChoice, OutputFormat};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub upgrade: UpgradeConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// How privileged operations are invoked
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeConfig {
    /// Program that elevates the helper (pkexec, lxqt-sudo, ...)
    #[serde(default = "default_privilege_wrapper")]
    pub privilege_wrapper: String,
    /// Privileged helper executable
    #[serde(default = "default_helper_path")]
    pub helper_path: PathBuf,
    /// Terminal emulator used by the interactive terminal flow
    #[serde(default = "default_terminal")]
    pub terminal: String,
    /// Refresh package lists before upgrading
    #[serde(default)]
    pub cache_update: bool,
    /// Never remove or newly install packages while upgrading
    #[serde(default)]
    pub safe_mode: bool,
}

/// Security classification configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SecurityConfig {
    /// Packages always reported as security relevant, whatever their origin
    #[serde(default)]
    pub always_security: Vec<String>,
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_meta_release_url")]
    pub meta_release_url: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub reboot_marker: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            privilege_wrapper: default_privilege_wrapper(),
            helper_path: default_helper_path(),
            terminal: default_terminal(),
            cache_update: false,
            safe_mode: false,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            meta_release_url: default_meta_release_url(),
            timeout: default_timeout(),
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_privilege_wrapper() -> String {
    "pkexec".to_string()
}

fn default_helper_path() -> PathBuf {
    PathBuf::from(fixed_paths::HELPER_PATH)
}

fn default_terminal() -> String {
    "x-terminal-emulator".to_string()
}

fn default_meta_release_url() -> String {
    "https://changelogs.ubuntu.com/meta-release".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Config {
    /// Get the per-user config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the user config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("upnotify").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to the system file and then defaults
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let candidates = [
            Self::default_path().ok(),
            Some(PathBuf::from(fixed_paths::SYSTEM_CONFIG)),
        ];

        for path in candidates.into_iter().flatten() {
            if fs::try_exists(&path).await.unwrap_or(false) {
                tracing::debug!(path = %path.display(), "loading configuration");
                return Self::load_from_file(&path).await;
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from an optional path or use default
    ///
    /// If path is provided, loads from that file.
    /// If path is None, uses the default loading behavior.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // UPNOTIFY_OUTPUT
        if let Ok(output) = std::env::var("UPNOTIFY_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "UPNOTIFY_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        // UPNOTIFY_COLOR
        if let Ok(color) = std::env::var("UPNOTIFY_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "UPNOTIFY_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        if let Ok(wrapper) = std::env::var("UPNOTIFY_PRIVILEGE_WRAPPER") {
            if wrapper.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "UPNOTIFY_PRIVILEGE_WRAPPER".to_string(),
                    value: wrapper,
                }
                .into());
            }
            self.upgrade.privilege_wrapper = wrapper;
        }

        if let Ok(terminal) = std::env::var("UPNOTIFY_TERMINAL") {
            self.upgrade.terminal = terminal;
        }

        if let Ok(helper) = std::env::var("UPNOTIFY_HELPER") {
            self.upgrade.helper_path = PathBuf::from(helper);
        }

        if let Ok(url) = std::env::var("UPNOTIFY_META_RELEASE_URL") {
            self.network.meta_release_url = url;
        }

        Ok(())
    }

    /// Get the reboot marker path (with default)
    #[must_use]
    pub fn reboot_marker(&self) -> PathBuf {
        self.paths
            .reboot_marker
            .clone()
            .unwrap_or_else(|| PathBuf::from(fixed_paths::REBOOT_REQUIRED))
    }

    /// Get the debug log directory (with default)
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.paths
            .log_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(fixed_paths::LOGS_DIR))
    }
}
