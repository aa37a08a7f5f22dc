//! Privileged helper subprocess speaking JSON lines

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use upnotify_errors::{Error, OpsError};
use upnotify_events::{wire, EventEmitter, EventSink};
use upnotify_platform::PlatformCommand;
use upnotify_types::OperationRequest;

use crate::backend::{CancelSignal, OperationBackend};
use crate::lines::LossyLines;

/// Exit codes pkexec uses when authorization was dismissed or refused
const AUTH_REFUSED_CODES: [i32; 2] = [126, 127];

/// Runs `<wrapper> <helper> <subcommand>` and decodes its event stream
///
/// Every stdout line is one encoded event. A cancel request is written to
/// the helper's stdin as the line `cancel`.
#[derive(Debug, Clone, Default)]
pub struct HelperBackend;

impl HelperBackend {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OperationBackend for HelperBackend {
    fn name(&self) -> &'static str {
        "helper"
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
        cmd.args(request.args());

        let mut child = cmd
            .to_tokio()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OpsError::LaunchFailed {
                command: request.command_line(),
                message: e.to_string(),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| OpsError::LaunchFailed {
            command: request.command_line(),
            message: "stdout not captured".to_string(),
        })?;
        let mut stdin = child.stdin.take();
        let mut lines = LossyLines::new(stdout);
        let mut cancel_sent = false;

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let line = match line {
                        Ok(Some(line)) => line,
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!(error = %e, "stopped reading helper output");
                            break;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match wire::decode_line(&line) {
                        Ok(event) => sink.emit(event),
                        Err(e) => tracing::warn!(error = %e, "ignoring helper output"),
                    }
                }
                () = cancel.requested(), if !cancel_sent => {
                    cancel_sent = true;
                    if let Some(stdin) = stdin.as_mut() {
                        if let Err(e) = stdin.write_all(b"cancel\n").await {
                            tracing::warn!(error = %e, "could not forward cancel to helper");
                        } else {
                            let _ = stdin.flush().await;
                        }
                    }
                }
            }
        }

        drop(stdin);
        let status = child.wait().await?;
        tracing::debug!(exit_code = ?status.code(), "helper exited");

        if sink.is_finished() || status.success() {
            return Ok(());
        }

        match status.code() {
            Some(code) if AUTH_REFUSED_CODES.contains(&code) => Err(OpsError::NotAuthorized {
                command: request.command_line(),
            }
            .into()),
            Some(code) => Err(OpsError::OperationFailed {
                message: format!("helper exited with status {code}"),
            }
            .into()),
            None => Err(OpsError::OperationFailed {
                message: "helper was terminated by a signal".to_string(),
            }
            .into()),
        }
    }
}
