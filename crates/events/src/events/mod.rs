use serde::{Deserialize, Serialize};
use std::fmt;
use upnotify_types::{ExitState, Status};

/// Identifier of one operation runner within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunnerId(pub u64);

impl fmt::Display for RunnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "runner-{}", self.0)
    }
}

/// Event emitted by a running privileged operation
///
/// A stream ends with exactly one `Finished`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationEvent {
    /// Overall completion; the backend is authoritative, values may go down
    ProgressChanged { percent: i32 },

    /// Backend moved to a new phase
    StatusChanged { status: Status },

    /// Free-form description of what the backend is doing
    StatusDetailChanged { detail: String },

    /// Byte progress for one downloaded item
    DownloadProgress {
        uri: String,
        short_desc: String,
        total_size: u64,
        current_size: u64,
        message: String,
    },

    /// Item counter; meaning depends on the stage consuming it
    ItemProgress { current_items: u64, total_items: u64 },

    /// Recoverable error; the operation keeps running until `Finished`
    ErrorRaised { code: i32, detail: String },

    /// Whether the backend currently accepts a cancel request
    CancellableChanged { cancellable: bool },

    /// Terminal event
    Finished { exit: ExitState },
}

impl OperationEvent {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::ErrorRaised { .. }
            | Self::Finished {
                exit: ExitState::Failed,
            } => Level::ERROR,
            Self::Finished { .. } | Self::StatusChanged { .. } => Level::INFO,
            Self::StatusDetailChanged { .. } | Self::CancellableChanged { .. } => Level::DEBUG,
            Self::ProgressChanged { .. }
            | Self::DownloadProgress { .. }
            | Self::ItemProgress { .. } => Level::TRACE,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::ProgressChanged { .. } | Self::ItemProgress { .. } => {
                "upnotify::events::progress"
            }
            Self::DownloadProgress { .. } => "upnotify::events::download",
            Self::StatusChanged { .. } | Self::StatusDetailChanged { .. } => {
                "upnotify::events::status"
            }
            Self::ErrorRaised { .. } => "upnotify::events::error",
            Self::CancellableChanged { .. } | Self::Finished { .. } => {
                "upnotify::events::lifecycle"
            }
        }
    }
}

/// An operation event tagged with the runner that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerEvent {
    pub runner: RunnerId,
    pub event: OperationEvent,
}

impl RunnerEvent {
    pub fn new(runner: RunnerId, event: OperationEvent) -> Self {
        Self { runner, event }
    }
}
