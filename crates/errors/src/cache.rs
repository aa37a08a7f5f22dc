//! Package cache error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CacheError {
    #[error("opening the cache failed: {message}")]
    OpenFailed { message: String },

    #[error("package cache is locked: {message}")]
    Locked { message: String },

    #[error("upgrade simulation failed with status {status}: {stderr}")]
    SimulationFailed { status: i32, stderr: String },

    #[error("malformed resolver output at line {line}: {content}")]
    MalformedOutput { line: usize, content: String },

    #[error("distribution codename unavailable: {message}")]
    CodenameUnavailable { message: String },
}

impl UserFacingError for CacheError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::Locked { .. } => {
                Some("Another package manager is running. Wait for it to finish.")
            }
            Self::OpenFailed { .. } | Self::SimulationFailed { .. } => {
                Some("Run `apt-get check` to inspect the package cache.")
            }
            Self::CodenameUnavailable { .. } => Some("Check that /etc/os-release is readable."),
            Self::MalformedOutput { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::OpenFailed { .. } => "cache.open_failed",
            Self::Locked { .. } => "cache.locked",
            Self::SimulationFailed { .. } => "cache.simulation_failed",
            Self::MalformedOutput { .. } => "cache.malformed_output",
            Self::CodenameUnavailable { .. } => "cache.codename_unavailable",
        })
    }
}
