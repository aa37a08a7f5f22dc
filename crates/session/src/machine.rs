//! Orchestration state machine
//!
//! [`SessionMachine::handle`] is the only way state changes. It never touches
//! a process or a channel itself; everything the outside world has to do is
//! returned as a list of [`Effect`]s.

use std::sync::Arc;

use upnotify_events::{error_codes, OperationEvent, RunnerEvent, RunnerId};
use upnotify_platform::RebootProbe;
use upnotify_types::{ChangeSet, ExitState, OperationKind, Status};

use crate::stage::Stage;
use crate::view::{ErrorEntry, SessionView};

pub const UPGRADES_AVAILABLE_TEXT: &str = "There are upgrades available. Do you want to do a system upgrade?\nThis will mean packages could be upgraded, installed or removed.";
pub const REBOOT_REQUIRED_TEXT: &str = "Reboot required";
pub const RELEASE_FALLBACK_TEXT: &str = "A new release is available";
pub const UP_TO_DATE_TEXT: &str = "The system is up to date";

/// Startup parameters of one session
#[derive(Debug, Clone, Default)]
pub struct SessionParams {
    /// Pending upgrade count reported by the caller
    pub upgrades: u32,
    /// Pending security upgrade count reported by the caller
    pub security_upgrades: u32,
    /// A distribution release upgrade is available
    pub release_upgrade: bool,
    /// Human-readable name of the target release
    pub release_text: Option<String>,
    /// An upgrader was configured; without one nothing can be applied
    pub can_apply: bool,
    /// Refresh the package lists before upgrading
    pub cache_update: bool,
    /// Upgrade without removing or newly installing packages
    pub safe: bool,
}

/// Something that happened to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Open,
    Classified(ChangeSet),
    Apply,
    Cancel,
    Runner(RunnerEvent),
}

/// Something the driver has to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// The view changed
    Render,
    /// Build a change set from a fresh resolution snapshot
    Classify { safe: bool },
    /// Start exactly one runner for `kind`
    Launch { runner: RunnerId, kind: OperationKind },
    /// Forward a cancel request to a runner
    CancelRunner(RunnerId),
    /// The session is over and its surface should go away
    Close,
}

#[derive(Debug, Clone, Copy)]
struct ActiveRunner {
    id: RunnerId,
    kind: OperationKind,
    errors_at_start: usize,
}

/// The orchestration state machine of one notifier session
pub struct SessionMachine {
    params: SessionParams,
    probe: Arc<dyn RebootProbe>,
    view: SessionView,
    active: Option<ActiveRunner>,
    last_kind: Option<OperationKind>,
    next_runner: u64,
    cancellable: bool,
    last_detail: Option<String>,
    item_text: Option<String>,
    rejected_events: u64,
    dirty: bool,
}

impl SessionMachine {
    pub fn new(params: SessionParams, probe: Arc<dyn RebootProbe>) -> Self {
        Self {
            params,
            probe,
            view: SessionView::new(false),
            active: None,
            last_kind: None,
            next_runner: 1,
            cancellable: false,
            last_detail: None,
            item_text: None,
            rejected_events: 0,
            dirty: false,
        }
    }

    #[must_use]
    pub fn view(&self) -> &SessionView {
        &self.view
    }

    #[must_use]
    pub fn stage(&self) -> Stage {
        self.view.stage
    }

    #[must_use]
    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Runner whose events are currently accepted
    #[must_use]
    pub fn active_runner(&self) -> Option<RunnerId> {
        self.active.map(|active| active.id)
    }

    /// Events dropped because they came from a runner that is not active
    #[must_use]
    pub fn rejected_events(&self) -> u64 {
        self.rejected_events
    }

    /// Apply one input and return what has to happen next
    ///
    /// When the view changed, [`Effect::Render`] comes first.
    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        let mut effects = Vec::new();
        match input {
            Input::Open => self.open(&mut effects),
            Input::Classified(change_set) => self.classified(change_set, &mut effects),
            Input::Apply => self.apply(&mut effects),
            Input::Cancel => self.cancel(&mut effects),
            Input::Runner(event) => self.runner_event(event, &mut effects),
        }

        if self.refresh_gates() || self.dirty {
            self.dirty = false;
            effects.insert(0, Effect::Render);
        }
        effects
    }

    fn open(&mut self, effects: &mut Vec<Effect>) {
        if self.view.stage != Stage::Idle {
            tracing::debug!(stage = %self.view.stage, "session already open");
            return;
        }

        self.view.reboot_required = self.probe.is_reboot_required();
        self.dirty = true;

        if self.params.upgrades > 0 {
            self.view.stage = Stage::Classifying;
            self.view.headline = "Checking for upgrades".to_string();
            effects.push(Effect::Classify {
                safe: self.params.safe,
            });
        } else {
            self.offer_without_upgrades(effects);
        }
    }

    fn classified(&mut self, change_set: ChangeSet, effects: &mut Vec<Effect>) {
        if self.view.stage != Stage::Classifying {
            tracing::warn!(stage = %self.view.stage, "unexpected classification result");
            return;
        }

        tracing::info!(
            changes = change_set.len(),
            security = change_set.security_count(),
            "classification finished"
        );
        self.dirty = true;

        if change_set.is_empty() {
            self.view.change_set = Some(change_set);
            self.offer_without_upgrades(effects);
            return;
        }

        let mut headline = UPGRADES_AVAILABLE_TEXT.to_string();
        let security = change_set.security_count();
        if security > 0 {
            let plural = if security == 1 { "" } else { "s" };
            headline.push_str(&format!("\n{security} security upgrade{plural}"));
        }
        if self.view.reboot_required {
            headline.push('\n');
            headline.push_str(REBOOT_REQUIRED_TEXT);
        }

        self.view.stage = Stage::AwaitingConfirm;
        self.view.headline = headline;
        self.view.change_set = Some(change_set);
    }

    // Zero upgrades: a release upgrade, a reboot notice, or nothing at all
    fn offer_without_upgrades(&mut self, effects: &mut Vec<Effect>) {
        if self.params.release_upgrade {
            self.offer_release_upgrade();
        } else if self.view.reboot_required {
            self.view.stage = Stage::AwaitingConfirm;
            self.view.headline = REBOOT_REQUIRED_TEXT.to_string();
        } else {
            tracing::info!("nothing to report");
            self.view.stage = Stage::Finished;
            self.view.headline = UP_TO_DATE_TEXT.to_string();
            effects.push(Effect::Close);
        }
    }

    fn offer_release_upgrade(&mut self) {
        let release = self
            .params
            .release_text
            .clone()
            .unwrap_or_else(|| RELEASE_FALLBACK_TEXT.to_string());

        let mut headline = format!("{release}\nDo you want to upgrade to the new release?");
        if self.view.reboot_required {
            headline.push('\n');
            headline.push_str(REBOOT_REQUIRED_TEXT);
        }

        self.view.stage = Stage::AwaitingReleaseConfirm;
        self.view.release = Some(release);
        self.view.headline = headline;
        self.dirty = true;
    }

    fn apply(&mut self, effects: &mut Vec<Effect>) {
        if let Some(active) = self.active {
            tracing::debug!(runner = %active.id, "apply ignored while an operation is running");
            return;
        }
        if !self.view.allow_apply {
            tracing::debug!(stage = %self.view.stage, "apply ignored");
            return;
        }

        match self.view.stage {
            Stage::AwaitingConfirm => {
                let kind = if self.params.cache_update {
                    OperationKind::UpdateCache
                } else {
                    OperationKind::SystemUpgrade {
                        safe: self.params.safe,
                    }
                };
                self.launch(kind, effects);
            }
            Stage::AwaitingReleaseConfirm => self.launch(OperationKind::ReleaseUpgrade, effects),
            stage => tracing::debug!(%stage, "apply ignored"),
        }
    }

    fn launch(&mut self, kind: OperationKind, effects: &mut Vec<Effect>) {
        let id = RunnerId(self.next_runner);
        self.next_runner += 1;

        self.active = Some(ActiveRunner {
            id,
            kind,
            errors_at_start: self.view.errors.len(),
        });
        self.last_kind = Some(kind);
        self.cancellable = false;
        self.last_detail = None;
        self.item_text = None;

        self.view.stage = Stage::for_operation(kind);
        self.view.status = None;
        self.view.percent = Some(0);
        self.view.headline = match kind {
            OperationKind::UpdateCache => "Updating package lists...",
            OperationKind::SystemUpgrade { .. } => "Upgrading...",
            OperationKind::ReleaseUpgrade => "Upgrading to the new release...",
        }
        .to_string();
        self.dirty = true;

        tracing::info!(runner = %id, operation = %kind, "launching operation");
        effects.push(Effect::Launch { runner: id, kind });
    }

    fn cancel(&mut self, effects: &mut Vec<Effect>) {
        let stage = self.view.stage;
        if stage.is_terminal() {
            effects.push(Effect::Close);
            return;
        }

        if stage.is_running() {
            match self.active {
                Some(active) if self.cancellable => {
                    tracing::info!(runner = %active.id, "forwarding cancel request");
                    effects.push(Effect::CancelRunner(active.id));
                }
                _ => tracing::warn!(%stage, "cancel rejected: operation is not cancellable"),
            }
            return;
        }

        if stage == Stage::AwaitingReleaseConfirm
            && matches!(self.last_kind, Some(OperationKind::SystemUpgrade { .. }))
        {
            // Only reachable after the upgrade succeeded
            tracing::info!("release upgrade declined");
            self.enter_terminal(Stage::Finished);
        } else {
            tracing::info!(%stage, "session cancelled by user");
            self.enter_terminal(Stage::Cancelled);
        }
        effects.push(Effect::Close);
    }

    fn runner_event(&mut self, envelope: RunnerEvent, effects: &mut Vec<Effect>) {
        let RunnerEvent { runner, event } = envelope;
        let Some(active) = self.active.filter(|active| active.id == runner) else {
            self.rejected_events += 1;
            tracing::warn!(%runner, ?event, "rejecting event from inactive runner");
            return;
        };

        match event {
            OperationEvent::ProgressChanged { percent } => {
                self.view.percent = Some(percent);
                self.dirty = true;
            }
            OperationEvent::StatusChanged { status } => {
                self.view.status = Some(status);
                self.view.headline = format!("Status: {}", status.label());
                self.dirty = true;
            }
            OperationEvent::DownloadProgress {
                uri,
                short_desc,
                total_size,
                current_size,
                message,
            } => {
                let key = if short_desc.is_empty() { uri } else { short_desc };
                let line = if message.is_empty() {
                    format!("{key}: {current_size}/{total_size}")
                } else {
                    format!("{key}: {current_size}/{total_size} {message}")
                };
                self.view.transcript.download_line(&key, line);
                self.dirty = true;
            }
            OperationEvent::ItemProgress {
                current_items,
                total_items,
            } => {
                if total_items == 0 {
                    return;
                }
                let verb = if active.kind == OperationKind::UpdateCache {
                    "Fetching"
                } else {
                    "Downloaded"
                };
                let text = format!("{verb} {current_items} of {total_items}");
                if self.item_text.as_deref() != Some(text.as_str()) {
                    self.item_text = Some(text);
                    self.view.headline = self.download_headline();
                    self.dirty = true;
                }
            }
            OperationEvent::StatusDetailChanged { detail } => {
                if self.last_detail.as_deref() == Some(detail.as_str()) {
                    return;
                }
                self.last_detail = Some(detail.clone());
                if self.is_downloading() {
                    self.view.headline = self.download_headline();
                } else {
                    self.view.transcript.push(detail.clone());
                    self.view.headline = detail;
                }
                self.dirty = true;
            }
            OperationEvent::ErrorRaised { code, detail } => {
                tracing::error!(%runner, code, %detail, "operation raised an error");
                self.view.errors.push(ErrorEntry::new(code, detail));
                self.dirty = true;
            }
            OperationEvent::CancellableChanged { cancellable } => {
                self.cancellable = cancellable;
            }
            OperationEvent::Finished { exit } => self.finish_operation(active, exit, effects),
        }
    }

    fn is_downloading(&self) -> bool {
        self.view.status == Some(Status::Downloading)
    }

    fn download_headline(&self) -> String {
        let detail = self
            .last_detail
            .as_deref()
            .filter(|_| self.is_downloading());
        match (self.item_text.as_deref(), detail) {
            (Some(items), Some(detail)) => format!("{items}\n{detail}"),
            (Some(items), None) => items.to_string(),
            (None, Some(detail)) => detail.to_string(),
            (None, None) => self.view.headline.clone(),
        }
    }

    fn finish_operation(&mut self, active: ActiveRunner, exit: ExitState, effects: &mut Vec<Effect>) {
        self.active = None;
        self.cancellable = false;
        self.dirty = true;
        let raised_errors = self.view.errors.len() > active.errors_at_start;

        tracing::info!(runner = %active.id, operation = %active.kind, ?exit, "operation finished");

        match (active.kind, exit) {
            (_, ExitState::Cancelled) => {
                self.enter_terminal(Stage::Cancelled);
                effects.push(Effect::Close);
            }
            (OperationKind::UpdateCache, exit) => {
                if exit == ExitState::Failed {
                    tracing::warn!("package list refresh failed, continuing with the upgrade");
                    if !raised_errors {
                        self.view.errors.push(ErrorEntry::new(
                            error_codes::CACHE_UPDATE_FAILED,
                            "Refreshing the package lists failed",
                        ));
                    }
                }
                self.launch(
                    OperationKind::SystemUpgrade {
                        safe: self.params.safe,
                    },
                    effects,
                );
            }
            (OperationKind::SystemUpgrade { .. }, ExitState::Success) => {
                if self.params.release_upgrade {
                    self.offer_release_upgrade();
                } else {
                    self.enter_terminal(Stage::Finished);
                }
            }
            (OperationKind::ReleaseUpgrade, ExitState::Success) => {
                self.enter_terminal(Stage::Finished);
                effects.push(Effect::Close);
            }
            (kind, ExitState::Failed) => {
                if !raised_errors {
                    self.view.errors.push(ErrorEntry::new(
                        error_codes::OPERATION_FAILED,
                        format!("The {kind} operation failed without reporting an error"),
                    ));
                }
                self.enter_terminal(Stage::Failed);
            }
        }
    }

    fn enter_terminal(&mut self, stage: Stage) {
        self.view.stage = stage;
        self.view.reboot_required = self.probe.is_reboot_required();
        self.dirty = true;

        let mut headline = match (stage, self.last_kind) {
            // Dismissed before anything ran: the offer stays on screen
            (Stage::Cancelled, None) => self.offer_headline(),
            (Stage::Finished, Some(OperationKind::ReleaseUpgrade)) => {
                "Release upgrade finished".to_string()
            }
            (Stage::Failed, Some(OperationKind::ReleaseUpgrade)) => {
                "Release upgrade failed".to_string()
            }
            (Stage::Cancelled, Some(OperationKind::ReleaseUpgrade)) => {
                "Release upgrade cancelled".to_string()
            }
            (Stage::Failed, _) => "Upgrade failed".to_string(),
            (Stage::Cancelled, _) => "Upgrade cancelled".to_string(),
            _ => "Upgrade finished".to_string(),
        };

        if !self.view.errors.is_empty() {
            headline.push_str(" with some errors");
            self.view.transcript.push("Error summary:");
            let lines: Vec<String> = self
                .view
                .errors
                .iter()
                .map(ErrorEntry::summary_line)
                .collect();
            for line in lines {
                self.view.transcript.push(line);
            }
        }
        if self.view.reboot_required {
            if !headline.is_empty() {
                headline.push('\n');
            }
            headline.push_str(REBOOT_REQUIRED_TEXT);
        } else if headline.is_empty() {
            headline.push_str(UP_TO_DATE_TEXT);
        }
        self.view.headline = headline;

        tracing::info!(
            %stage,
            errors = self.view.errors.len(),
            reboot_required = self.view.reboot_required,
            "session reached a terminal stage"
        );
    }

    // Current headline without the reboot line, which is re-added from a fresh check
    fn offer_headline(&self) -> String {
        let headline = self.view.headline.as_str();
        headline
            .strip_suffix(REBOOT_REQUIRED_TEXT)
            .map_or(headline, |rest| rest.trim_end_matches('\n'))
            .to_string()
    }

    // Returns whether a gate changed
    fn refresh_gates(&mut self) -> bool {
        let stage = self.view.stage;
        let allow_apply = self.params.can_apply
            && match stage {
                Stage::AwaitingConfirm => self
                    .view
                    .change_set
                    .as_ref()
                    .is_some_and(|change_set| !change_set.is_empty()),
                Stage::AwaitingReleaseConfirm => true,
                _ => false,
            };
        let allow_cancel = if stage.is_running() {
            self.cancellable
        } else {
            !stage.is_terminal()
        };

        let changed = allow_apply != self.view.allow_apply || allow_cancel != self.view.allow_cancel;
        self.view.allow_apply = allow_apply;
        self.view.allow_cancel = allow_cancel;
        changed
    }
}
