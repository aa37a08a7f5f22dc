//! Direct `apt-get` / `do-release-upgrade` execution

use std::process::Stdio;

use async_trait::async_trait;
use upnotify_errors::{Error, OpsError};
use upnotify_events::{error_codes, EventEmitter, EventSink, OperationEvent};
use upnotify_platform::PlatformCommand;
use upnotify_types::{ExitState, OperationKind, OperationRequest, Status};

use crate::backend::{CancelSignal, OperationBackend};
use crate::lines::LossyLines;
use crate::status_fd::StatusFdParser;

/// Runs the package manager in-process; requires administrative rights
///
/// `apt-get` requests are expected to carry `-o APT::Status-Fd=1` (see
/// [`Invocation::Direct`](crate::Invocation::Direct)) so progress can be
/// parsed. Release upgrades forward every output line as status detail.
#[derive(Debug, Clone, Default)]
pub struct AptBackend;

impl AptBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OperationBackend for AptBackend {
    fn name(&self) -> &'static str {
        "apt"
    }

    async fn execute(
        &self,
        request: &OperationRequest,
        sink: &EventSink,
        mut cancel: CancelSignal,
    ) -> Result<(), Error> {
        let program = request.program().ok_or_else(|| OpsError::EmptyCommand {
            operation: request.kind.to_string(),
        })?;
        let mut cmd = PlatformCommand::new(program);
        cmd.args(request.args())
            .env("DEBIAN_FRONTEND", "noninteractive")
            .env("LC_ALL", "C");

        let mut child = cmd
            .to_tokio()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OpsError::LaunchFailed {
                command: request.command_line(),
                message: e.to_string(),
            })?;

        let launch_error = || OpsError::LaunchFailed {
            command: request.command_line(),
            message: "output not captured".to_string(),
        };
        let mut stdout = LossyLines::new(child.stdout.take().ok_or_else(launch_error)?);
        let mut stderr = LossyLines::new(child.stderr.take().ok_or_else(launch_error)?);

        let release_upgrade = request.kind == OperationKind::ReleaseUpgrade;
        let mut parser = StatusFdParser::new(request.kind);
        let emit_all = |events: Vec<OperationEvent>| {
            for event in events {
                sink.emit(event);
            }
        };

        sink.emit_cancellable(false);
        sink.emit_status(if release_upgrade {
            Status::Running
        } else {
            Status::Waiting
        });

        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut cancel_handled = false;
        let mut killed = false;

        while stdout_open || stderr_open {
            tokio::select! {
                line = stdout.next_line(), if stdout_open => match line {
                    Ok(Some(line)) if release_upgrade => {
                        if !line.trim().is_empty() {
                            sink.emit_detail(line.trim());
                        }
                    }
                    Ok(Some(line)) => emit_all(parser.parse_stdout(&line)),
                    Ok(None) => stdout_open = false,
                    Err(e) => {
                        // The child keeps running; its exit status still decides the outcome
                        tracing::warn!(error = %e, "stopped reading package manager stdout");
                        stdout_open = false;
                    }
                },
                line = stderr.next_line(), if stderr_open => match line {
                    Ok(Some(line)) => emit_all(parser.parse_stderr(&line)),
                    Ok(None) => stderr_open = false,
                    Err(e) => {
                        tracing::warn!(error = %e, "stopped reading package manager stderr");
                        stderr_open = false;
                    }
                },
                () = cancel.requested(), if !cancel_handled => {
                    cancel_handled = true;
                    if parser.is_cancellable() {
                        tracing::info!("stopping apt during download");
                        match child.start_kill() {
                            Ok(()) => killed = true,
                            Err(e) => tracing::warn!(error = %e, "could not stop apt"),
                        }
                    } else {
                        tracing::info!("ignoring cancel outside the download phase");
                    }
                }
            }
        }

        let status = child.wait().await?;
        tracing::debug!(exit_code = ?status.code(), "package manager exited");

        if killed && !status.success() {
            sink.emit_finished(ExitState::Cancelled);
        } else if status.success() {
            sink.emit_progress(100);
            sink.emit_status(Status::Finished);
            sink.emit_finished(ExitState::Success);
        } else {
            if parser.error_count() == 0 {
                sink.emit_error(
                    error_codes::OPERATION_FAILED,
                    match status.code() {
                        Some(code) => format!("{program} exited with status {code}"),
                        None => format!("{program} was terminated by a signal"),
                    },
                );
            }
            sink.emit_finished(ExitState::Failed);
        }
        Ok(())
    }
}
