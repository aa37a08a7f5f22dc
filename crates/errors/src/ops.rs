//! Operation orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OpsError {
    #[error("operation failed: {message}")]
    OperationFailed { message: String },

    #[error("failed to launch {command}: {message}")]
    LaunchFailed { command: String, message: String },

    #[error("authorization refused for {command}")]
    NotAuthorized { command: String },

    #[error("operation already running: {operation}")]
    AlreadyRunning { operation: String },

    #[error("operation is not cancellable right now")]
    NotCancellable,

    #[error("malformed event line: {line}")]
    MalformedEvent { line: String },

    #[error("empty command for {operation}")]
    EmptyCommand { operation: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },

    #[error("event channel closed")]
    EventChannelClosed,
}

impl UserFacingError for OpsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::LaunchFailed { .. } => {
                Some("Check the privilege wrapper and helper paths in the configuration.")
            }
            Self::NotAuthorized { .. } => Some("Authenticate as an administrator and retry."),
            Self::AlreadyRunning { .. } => Some("Wait for the running operation to finish."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::NotAuthorized { .. } | Self::AlreadyRunning { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        Some(match self {
            Self::OperationFailed { .. } => "ops.operation_failed",
            Self::LaunchFailed { .. } => "ops.launch_failed",
            Self::NotAuthorized { .. } => "ops.not_authorized",
            Self::AlreadyRunning { .. } => "ops.already_running",
            Self::NotCancellable => "ops.not_cancellable",
            Self::MalformedEvent { .. } => "ops.malformed_event",
            Self::EmptyCommand { .. } => "ops.empty_command",
            Self::SerializationError { .. } => "ops.serialization",
            Self::EventChannelClosed => "ops.event_channel_closed",
        })
    }
}
