//! Backend seam and cancellation signal

use async_trait::async_trait;
use tokio::sync::watch;
use upnotify_errors::Error;
use upnotify_events::EventSink;
use upnotify_types::OperationRequest;

/// Something that can carry out one privileged operation
#[async_trait]
pub trait OperationBackend: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Run `request` to completion, reporting through `sink`
    ///
    /// A backend that finishes normally emits its own `Finished` event and
    /// returns `Ok(())`. Returning an error, or returning without a terminal
    /// event, makes the runner close the stream with a failure.
    async fn execute(
        &self,
        request: &OperationRequest,
        sink: &EventSink,
        cancel: CancelSignal,
    ) -> Result<(), Error>;
}

/// Receiving half of a runner's cancel request
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Create a connected sender and signal
    #[must_use]
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// Resolve once cancellation is requested
    ///
    /// Pends forever if the requesting side is dropped without asking.
    pub async fn requested(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
