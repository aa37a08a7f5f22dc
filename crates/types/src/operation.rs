//! Privileged operation descriptions and their outcome types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which privileged action an operation performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationKind {
    /// Refresh package lists from the configured archives
    UpdateCache,
    /// Upgrade installed packages; `safe` forbids removals and new installs
    SystemUpgrade { safe: bool },
    /// Move to the next distribution release
    ReleaseUpgrade,
}

impl OperationKind {
    /// Upgrade-class operations change installed packages; at most one may run
    #[must_use]
    pub fn is_upgrade_class(self) -> bool {
        !matches!(self, Self::UpdateCache)
    }

    /// Subcommand understood by the privileged helper
    #[must_use]
    pub fn helper_args(self) -> Vec<String> {
        match self {
            Self::UpdateCache => vec!["update-cache".to_string()],
            Self::SystemUpgrade { safe: true } => {
                vec!["upgrade".to_string(), "--safe".to_string()]
            }
            Self::SystemUpgrade { safe: false } => vec!["upgrade".to_string()],
            Self::ReleaseUpgrade => vec!["release-upgrade".to_string()],
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpdateCache => write!(f, "update-cache"),
            Self::SystemUpgrade { safe: true } => write!(f, "safe-upgrade"),
            Self::SystemUpgrade { safe: false } => write!(f, "full-upgrade"),
            Self::ReleaseUpgrade => write!(f, "release-upgrade"),
        }
    }
}

/// One privileged action plus the argument vector that invokes it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequest {
    pub kind: OperationKind,
    pub argv: Vec<String>,
}

impl OperationRequest {
    pub fn new(kind: OperationKind, argv: Vec<String>) -> Self {
        Self { kind, argv }
    }

    /// Program to execute, if the argument vector is not empty
    #[must_use]
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    /// Arguments after the program
    #[must_use]
    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }

    /// Shell-like rendering for logs
    #[must_use]
    pub fn command_line(&self) -> String {
        self.argv.join(" ")
    }
}

/// How an operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitState {
    Success,
    Failed,
    Cancelled,
}

impl ExitState {
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Phase reported by a running backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Waiting,
    WaitingLock,
    LoadingCache,
    Resolving,
    Running,
    Downloading,
    Committing,
    CleaningUp,
    Finished,
}

impl Status {
    /// Human readable phase label
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Waiting => "Waiting for service to start",
            Self::WaitingLock => "Waiting for other software managers to quit",
            Self::LoadingCache => "Loading cache",
            Self::Resolving => "Resolving dependencies",
            Self::Running => "Running task",
            Self::Downloading => "Downloading",
            Self::Committing => "Applying changes",
            Self::CleaningUp => "Cleaning up",
            Self::Finished => "Finished",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
