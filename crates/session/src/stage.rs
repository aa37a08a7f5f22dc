//! Session stages

use serde::{Deserialize, Serialize};
use std::fmt;
use upnotify_types::OperationKind;

/// Where a session is in its lifecycle
///
/// ```text
/// Idle -> Classifying -> AwaitingConfirm -> UpdatingCache -> RunningUpgrade
///      -> AwaitingReleaseConfirm -> RunningReleaseUpgrade
///      -> Finished | Failed | Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Classifying,
    AwaitingConfirm,
    UpdatingCache,
    RunningUpgrade,
    AwaitingReleaseConfirm,
    RunningReleaseUpgrade,
    Finished,
    Failed,
    Cancelled,
}

impl Stage {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Failed | Self::Cancelled)
    }

    /// Whether an operation runner belongs to this stage
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(
            self,
            Self::UpdatingCache | Self::RunningUpgrade | Self::RunningReleaseUpgrade
        )
    }

    /// Whether the session waits for the user to apply or dismiss
    #[must_use]
    pub fn is_awaiting(self) -> bool {
        matches!(self, Self::AwaitingConfirm | Self::AwaitingReleaseConfirm)
    }

    /// Stage that runs operations of `kind`
    #[must_use]
    pub fn for_operation(kind: OperationKind) -> Self {
        match kind {
            OperationKind::UpdateCache => Self::UpdatingCache,
            OperationKind::SystemUpgrade { .. } => Self::RunningUpgrade,
            OperationKind::ReleaseUpgrade => Self::RunningReleaseUpgrade,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Classifying => "classifying",
            Self::AwaitingConfirm => "awaiting-confirm",
            Self::UpdatingCache => "updating-cache",
            Self::RunningUpgrade => "running-upgrade",
            Self::AwaitingReleaseConfirm => "awaiting-release-confirm",
            Self::RunningReleaseUpgrade => "running-release-upgrade",
            Self::Finished => "finished",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}
