#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Privileged operation runners for upnotify
//!
//! This crate launches one long-running package operation at a time and
//! turns whatever the backend reports into the typed
//! [`OperationEvent`](upnotify_events::OperationEvent) stream. Backends:
//!
//! - [`HelperBackend`]: the privileged helper under a wrapper such as
//!   `pkexec`, speaking JSON lines
//! - [`TerminalBackend`]: an interactive terminal running apt, judged by
//!   exit status only
//! - [`AptBackend`]: `apt-get` itself with a status file descriptor, used
//!   inside the helper

mod apt;
mod backend;
mod helper;
mod invocation;
mod lines;
mod runner;
mod status_fd;
mod terminal;

pub use apt::AptBackend;
pub use backend::{CancelSignal, OperationBackend};
pub use helper::HelperBackend;
pub use invocation::Invocation;
pub use runner::{OperationRunner, RunnerHandle};
pub use status_fd::StatusFdParser;
pub use terminal::TerminalBackend;

use upnotify_errors::{Error, OpsError, PlatformError};
use upnotify_events::error_codes;

/// Event error code that best describes a backend failure
#[must_use]
pub fn error_code_for(error: &Error) -> i32 {
    match error {
        Error::Ops(OpsError::NotAuthorized { .. }) => error_codes::NOT_AUTHORIZED,
        Error::Ops(OpsError::LaunchFailed { .. } | OpsError::EmptyCommand { .. })
        | Error::Platform(
            PlatformError::CommandNotFound { .. } | PlatformError::ProcessExecutionFailed { .. },
        ) => error_codes::LAUNCH_FAILED,
        Error::Ops(OpsError::OperationFailed { .. }) => error_codes::OPERATION_FAILED,
        _ => error_codes::BACKEND_TERMINATED,
    }
}
