//! Interactive terminal running the package manager

use async_trait::async_trait;
use upnotify_errors::{Error, OpsError};
use upnotify_events::{error_codes, EventEmitter, EventSink};
use upnotify_platform::PlatformCommand;
use upnotify_types::{ExitState, OperationRequest, Status};

use crate::backend::{CancelSignal, OperationBackend};

/// Opens a terminal emulator and waits for it to close
///
/// The user drives apt inside the terminal, so the only signal is the exit
/// status. Never cancellable from the notifier.
#[derive(Debug, Clone, Default)]
pub struct TerminalBackend;

impl TerminalBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OperationBackend for TerminalBackend {
    fn name(&self) -> &'static str {
        "terminal"
    }

    async fn execute(
        &self,
        request: &OperationRequest,
        sink: &EventSink,
        _cancel: CancelSignal,
    ) -> Result<(), Error> {
        let program = request.program().ok_or_else(|| OpsError::EmptyCommand {
            operation: request.kind.to_string(),
        })?;
        let mut cmd = PlatformCommand::new(program);
        cmd.args(request.args());

        let mut child = cmd
            .to_tokio()
            .spawn()
            .map_err(|e| OpsError::LaunchFailed {
                command: request.command_line(),
                message: e.to_string(),
            })?;

        sink.emit_cancellable(false);
        sink.emit_status(Status::Running);
        sink.emit_detail(request.command_line());

        let status = child.wait().await?;
        if status.success() {
            sink.emit_progress(100);
            sink.emit_finished(ExitState::Success);
        } else {
            let detail = match status.code() {
                Some(code) => format!("{} exited with status {code}", request.command_line()),
                None => format!("{} was terminated by a signal", request.command_line()),
            };
            sink.emit_error(error_codes::OPERATION_FAILED, detail);
            sink.emit_finished(ExitState::Failed);
        }
        Ok(())
    }
}
