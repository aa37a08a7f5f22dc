//! Platform-specific operation errors

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Errors that can occur during platform-specific operations
#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlatformError {
    #[error("process execution failed: {command} - {message}")]
    ProcessExecutionFailed { command: String, message: String },

    #[error("command not found: {command}")]
    CommandNotFound { command: String },

    #[error("administrative rights required: {operation}")]
    NotPrivileged { operation: String },

    #[error("os-release unreadable: {message}")]
    OsReleaseUnavailable { message: String },
}

impl UserFacingError for PlatformError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotPrivileged { .. } => Some(
                "Please run this software with administrative rights, for example through pkexec.",
            ),
            Self::CommandNotFound { .. } => Some("Install the missing program or fix PATH."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::ProcessExecutionFailed { .. } => "platform.process_failed",
            Self::CommandNotFound { .. } => "platform.command_not_found",
            Self::NotPrivileged { .. } => "platform.not_privileged",
            Self::OsReleaseUnavailable { .. } => "platform.os_release",
        })
    }
}
