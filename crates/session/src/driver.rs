//! Session driver
//!
//! One task owns the [`SessionMachine`]. It waits on runner events and user
//! commands with a single `select!` loop and carries out the effects the
//! machine returns. Runners work on their own tasks, so the loop never blocks
//! on the package manager.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{Instrument, Level};
use upnotify_cache::{build_change_set, SecurityClassifier, SnapshotSource};
use upnotify_errors::Error;
use upnotify_events::{EventReceiver, RunnerEvent};
use upnotify_ops::{Invocation, OperationBackend, OperationRunner, RunnerHandle};
use upnotify_types::ChangeSet;
use uuid::Uuid;

use crate::machine::{Effect, Input, SessionMachine};
use crate::stage::Stage;
use crate::view::{ErrorEntry, SessionView};

/// Renders session views
pub trait Reporter: Send {
    fn render(&mut self, view: &SessionView);
}

/// Action requested by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Apply,
    Cancel,
}

/// How a session ended
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub stage: Stage,
    pub errors: Vec<ErrorEntry>,
    pub reboot_required: bool,
    pub rejected_events: u64,
}

/// One notifier session, from opening to a terminal stage
pub struct Session {
    machine: SessionMachine,
    snapshots: Arc<dyn SnapshotSource>,
    backend: Arc<dyn OperationBackend>,
    invocation: Invocation,
    always_security: Vec<String>,
}

impl Session {
    pub fn new(
        machine: SessionMachine,
        snapshots: Arc<dyn SnapshotSource>,
        backend: Arc<dyn OperationBackend>,
        invocation: Invocation,
    ) -> Self {
        Self {
            machine,
            snapshots,
            backend,
            invocation,
            always_security: Vec::new(),
        }
    }

    /// Packages always reported as security upgrades
    #[must_use]
    pub fn with_always_security(mut self, names: Vec<String>) -> Self {
        self.always_security = names;
        self
    }

    /// Drive the session until it reaches a terminal stage
    ///
    /// A closed command channel counts as a cancel request.
    ///
    /// # Errors
    ///
    /// Returns an error if classification fails; the package cache could not
    /// be read and no session can be shown.
    pub async fn run<R: Reporter>(
        self,
        reporter: &mut R,
        commands: UnboundedReceiver<UserCommand>,
    ) -> Result<SessionOutcome, Error> {
        let span = tracing::info_span!("session", id = %Uuid::new_v4());
        self.drive(reporter, commands).instrument(span).await
    }

    async fn drive<R: Reporter>(
        mut self,
        reporter: &mut R,
        mut commands: UnboundedReceiver<UserCommand>,
    ) -> Result<SessionOutcome, Error> {
        let (tx, mut events): (_, EventReceiver) = upnotify_events::channel();
        let runner = OperationRunner::new(Arc::clone(&self.backend), tx);
        let mut active: Option<RunnerHandle> = None;
        let mut commands_open = true;

        let mut pending = self.machine.handle(Input::Open);
        loop {
            while !pending.is_empty() {
                for effect in std::mem::take(&mut pending) {
                    match effect {
                        Effect::Render => reporter.render(self.machine.view()),
                        Effect::Classify { safe } => {
                            let change_set = self.classify(safe).await?;
                            pending.extend(self.machine.handle(Input::Classified(change_set)));
                        }
                        Effect::Launch { runner: id, kind } => {
                            let request = self.invocation.request(kind);
                            if let Some(previous) = active.replace(runner.spawn(id, request)) {
                                previous.join().await;
                            }
                        }
                        Effect::CancelRunner(id) => {
                            if let Some(handle) = active.as_ref().filter(|h| h.id() == id) {
                                handle.cancel();
                            }
                        }
                        Effect::Close => tracing::debug!("session close requested"),
                    }
                }
            }

            if self.machine.stage().is_terminal() {
                break;
            }

            tokio::select! {
                Some(event) = events.recv() => {
                    log_event(&event);
                    pending = self.machine.handle(Input::Runner(event));
                }
                command = commands.recv(), if commands_open => {
                    let input = match command {
                        Some(UserCommand::Apply) => Input::Apply,
                        Some(UserCommand::Cancel) => Input::Cancel,
                        None => {
                            tracing::debug!("command channel closed");
                            commands_open = false;
                            Input::Cancel
                        }
                    };
                    pending = self.machine.handle(input);
                }
                else => {
                    return Err(Error::internal("session lost both event and command channels"));
                }
            }
        }

        if let Some(handle) = active.take() {
            handle.join().await;
        }

        let view = self.machine.view();
        Ok(SessionOutcome {
            stage: view.stage,
            errors: view.errors.clone(),
            reboot_required: view.reboot_required,
            rejected_events: self.machine.rejected_events(),
        })
    }

    async fn classify(&self, safe: bool) -> Result<ChangeSet, Error> {
        let codename = self.snapshots.codename().await?;
        let snapshot = self.snapshots.snapshot(safe).await?;
        let classifier = SecurityClassifier::new(&codename)
            .with_always_security(self.always_security.iter().cloned());
        Ok(build_change_set(&snapshot, &classifier))
    }
}

fn log_event(envelope: &RunnerEvent) {
    let RunnerEvent { runner, event } = envelope;
    let kind = event.log_target();
    match event.log_level() {
        Level::ERROR => tracing::error!(%runner, kind, ?event, "operation event"),
        Level::WARN => tracing::warn!(%runner, kind, ?event, "operation event"),
        Level::INFO => tracing::info!(%runner, kind, ?event, "operation event"),
        Level::DEBUG => tracing::debug!(%runner, kind, ?event, "operation event"),
        _ => tracing::trace!(%runner, kind, ?event, "operation event"),
    }
}
