#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in upnotify
//!
//! Privileged operations report what they are doing through a typed event
//! stream. Every runner owns an [`EventSink`] tagged with its [`RunnerId`];
//! the orchestration session is the single subscriber on the other end of
//! the channel.
//!
//! ## Architecture
//!
//! - **Typed events**: [`OperationEvent`] is a closed enum, no string event names
//! - **Unified `EventEmitter` trait**: one API for every emission helper
//! - **Terminal guarantee**: a sink forwards at most one `Finished` and drops
//!   everything after it
//! - **Wire format**: [`wire`] encodes events as JSON lines for the helper process

pub mod error_codes;
pub mod events;
pub mod wire;

pub use events::{OperationEvent, RunnerEvent, RunnerId};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use upnotify_types::{ExitState, Status};

/// Type alias for event sender
pub type EventSender = UnboundedSender<RunnerEvent>;

/// Type alias for event receiver
pub type EventReceiver = tokio::sync::mpsc::UnboundedReceiver<RunnerEvent>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting operation events
///
/// Implementors only provide [`EventEmitter::emit`]; the helpers build the
/// individual event variants.
pub trait EventEmitter {
    /// Emit an event through this emitter
    fn emit(&self, event: OperationEvent);

    /// Emit an overall progress update
    fn emit_progress(&self, percent: i32) {
        self.emit(OperationEvent::ProgressChanged { percent });
    }

    /// Emit a phase change
    fn emit_status(&self, status: Status) {
        self.emit(OperationEvent::StatusChanged { status });
    }

    /// Emit a free-form status detail
    fn emit_detail(&self, detail: impl Into<String>) {
        self.emit(OperationEvent::StatusDetailChanged {
            detail: detail.into(),
        });
    }

    /// Emit an item counter update
    fn emit_items(&self, current_items: u64, total_items: u64) {
        self.emit(OperationEvent::ItemProgress {
            current_items,
            total_items,
        });
    }

    /// Emit a recoverable error
    fn emit_error(&self, code: i32, detail: impl Into<String>) {
        self.emit(OperationEvent::ErrorRaised {
            code,
            detail: detail.into(),
        });
    }

    /// Emit a cancellability change
    fn emit_cancellable(&self, cancellable: bool) {
        self.emit(OperationEvent::CancellableChanged { cancellable });
    }

    /// Emit the terminal event
    fn emit_finished(&self, exit: ExitState) {
        self.emit(OperationEvent::Finished { exit });
    }
}

/// Per-runner emitter that enforces the single-terminal-event rule
#[derive(Debug, Clone)]
pub struct EventSink {
    runner: RunnerId,
    tx: EventSender,
    finished: Arc<AtomicBool>,
}

impl EventSink {
    pub fn new(runner: RunnerId, tx: EventSender) -> Self {
        Self {
            runner,
            tx,
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn runner(&self) -> RunnerId {
        self.runner
    }

    /// Whether the terminal event has already been forwarded
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }
}

impl EventEmitter for EventSink {
    fn emit(&self, event: OperationEvent) {
        if event.is_terminal() {
            if self.finished.swap(true, Ordering::SeqCst) {
                tracing::debug!(runner = %self.runner, "dropping duplicate terminal event");
                return;
            }
        } else if self.is_finished() {
            tracing::debug!(runner = %self.runner, ?event, "dropping event after terminal event");
            return;
        }
        // Ignore send errors - if receiver is dropped, we just continue
        let _ = self.tx.send(RunnerEvent::new(self.runner, event));
    }
}
