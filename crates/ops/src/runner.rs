//! Operation runner: one backend invocation on its own task

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;
use upnotify_errors::Error;
use upnotify_events::{error_codes, EventEmitter, EventSender, EventSink, RunnerId};
use upnotify_types::{ExitState, OperationRequest};

use crate::backend::{CancelSignal, OperationBackend};
use crate::error_code_for;

/// Spawns backend invocations that report into one event channel
#[derive(Clone)]
pub struct OperationRunner {
    backend: Arc<dyn OperationBackend>,
    tx: EventSender,
}

impl OperationRunner {
    pub fn new(backend: Arc<dyn OperationBackend>, tx: EventSender) -> Self {
        Self { backend, tx }
    }

    /// Start `request` on a new task and return immediately
    ///
    /// Exactly one `Finished` event tagged with `runner` reaches the channel,
    /// even when the backend cannot be launched or stops without reporting.
    #[must_use]
    pub fn spawn(&self, runner: RunnerId, request: OperationRequest) -> RunnerHandle {
        let (cancel_tx, cancel) = CancelSignal::channel();
        let sink = EventSink::new(runner, self.tx.clone());
        let backend = Arc::clone(&self.backend);
        let kind = request.kind;

        let span = tracing::info_span!(
            "operation",
            %runner,
            operation = %kind,
            backend = backend.name()
        );
        let task = tokio::spawn(
            async move {
                tracing::info!(command = %request.command_line(), "starting operation");
                // A panicking backend must still close the stream
                let worker = {
                    let sink = sink.clone();
                    tokio::spawn(
                        async move { backend.execute(&request, &sink, cancel).await }
                            .in_current_span(),
                    )
                };
                let result = match worker.await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!(error = %e, "operation backend aborted");
                        Err(Error::internal(format!("operation backend aborted: {e}")))
                    }
                };
                settle(&sink, result);
            }
            .instrument(span),
        );

        RunnerHandle {
            runner,
            cancel_tx,
            task,
        }
    }
}

// Close the stream if the backend did not
fn settle(sink: &EventSink, result: Result<(), Error>) {
    if sink.is_finished() {
        if let Err(e) = result {
            tracing::debug!(error = %e, "backend error after terminal event");
        }
        return;
    }

    let (code, detail) = match result {
        Ok(()) => (
            error_codes::BACKEND_TERMINATED,
            "The operation ended without reporting completion".to_string(),
        ),
        Err(e) => (error_code_for(&e), e.to_string()),
    };
    tracing::warn!(code, %detail, "operation failed before completion");
    sink.emit_error(code, detail);
    sink.emit_finished(ExitState::Failed);
}

/// Control handle for one spawned operation
#[derive(Debug)]
pub struct RunnerHandle {
    runner: RunnerId,
    cancel_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl RunnerHandle {
    #[must_use]
    pub fn id(&self) -> RunnerId {
        self.runner
    }

    /// Forward a cancel request to the backend
    ///
    /// The backend decides whether and when to stop; no event is produced
    /// here.
    pub fn cancel(&self) {
        tracing::info!(runner = %self.runner, "cancel requested");
        self.cancel_tx.send_replace(true);
    }

    /// Wait for the worker task to exit
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(runner = %self.runner, error = %e, "operation task aborted");
        }
    }
}
