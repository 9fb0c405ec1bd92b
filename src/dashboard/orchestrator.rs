//! Facade composing the view-state machine, reveal scheduler and expansion
//! controller.
//!
//! The orchestrator is the only component that touches the timer service and
//! the only one the rest of an application calls. Every command returns the
//! resulting [`RenderSnapshot`]; intermediate snapshots (for example the
//! collapsed frame between two expansions) go to subscribed observers.
//!
//! Dropping an orchestrator cancels every timer it still has armed.

use std::collections::HashMap;
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;

use super::expansion::Restore;
use super::model::{
    CardId, CardSet, DashboardCmd, DashboardModel, DashboardMsg, ExpansionState, TimerSlot,
    ViewState,
};
use super::snapshot::RenderSnapshot;
use super::timer::{FiredTimer, ThreadTimer, TimerHandle, TimerService, VirtualClock};
use super::update::update;
use super::view_state::NormalPhase;
use crate::core::config::{Config, RevealConfig, TimingConfig};
use crate::core::errors::{DashError, Result};
use crate::logger::Journal;
use crate::logger::jsonl::{EventType, JsonlConfig, JsonlWriter, LogEntry, Severity};

/// Callback receiving every emitted snapshot.
pub type SnapshotObserver = Box<dyn FnMut(&RenderSnapshot)>;

/// One dashboard session.
pub struct Orchestrator<T: TimerService> {
    model: DashboardModel,
    timer: T,
    pending: HashMap<TimerSlot, TimerHandle>,
    observers: Vec<SnapshotObserver>,
    journal: Option<Box<dyn Journal>>,
    snapshot: RenderSnapshot,
}

impl<T: TimerService> std::fmt::Debug for Orchestrator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("view_state", &self.model.view.current())
            .field("expansion", &self.model.expansion.state())
            .field("pending", &self.pending)
            .field("observers", &self.observers.len())
            .field("journal", &self.journal.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: TimerService> Orchestrator<T> {
    /// Start a session in `Normal` with nothing expanded.
    pub fn new(cards: CardSet, timing: TimingConfig, reveal: RevealConfig, timer: T) -> Self {
        let model = DashboardModel::new(cards, timing, reveal);
        let snapshot = model.snapshot();
        Self {
            model,
            timer,
            pending: HashMap::new(),
            observers: Vec::new(),
            journal: None,
            snapshot,
        }
    }

    /// Build a session from loaded configuration, attaching the JSONL journal
    /// when it is enabled.
    pub fn from_config(config: &Config, timer: T) -> Result<Self> {
        let cards = config.cards.card_set()?;
        let orchestrator = Self::new(
            cards,
            config.timing.clone(),
            config.reveal.clone(),
            timer,
        );
        if config.journal.enabled {
            let writer = JsonlWriter::open(JsonlConfig {
                path: config.journal.path.clone(),
                fallback_path: config.journal.fallback_path.clone(),
            });
            return Ok(orchestrator.with_journal(writer));
        }
        Ok(orchestrator)
    }

    /// Record every transition to `journal`.
    #[must_use]
    pub fn with_journal(mut self, journal: impl Journal + 'static) -> Self {
        self.journal = Some(Box::new(journal));
        let mut entry = LogEntry::new(EventType::SessionStart, Severity::Info);
        entry.card = Some(self.model.cards.len());
        self.record(entry);
        self
    }

    /// Receive every snapshot the session emits, including intermediate ones.
    pub fn subscribe(&mut self, observer: impl FnMut(&RenderSnapshot) + 'static) {
        self.observers.push(Box::new(observer));
    }

    // ──────────────────── command surface ────────────────────

    pub fn set_view_state(&mut self, next: ViewState) -> RenderSnapshot {
        self.dispatch(DashboardMsg::SetViewState(next));
        self.emit()
    }

    /// Fails only for a card outside this session's card set.
    pub fn toggle_card(&mut self, id: CardId) -> Result<RenderSnapshot> {
        if let Err(err) = self.model.cards.check(id) {
            let mut entry = LogEntry::new(EventType::UnknownCard, Severity::Warning);
            entry.card = Some(id.stagger_index());
            self.record(entry.details(err.to_string()));
            return Err(err);
        }
        self.dispatch(DashboardMsg::ToggleCard(id));
        Ok(self.emit())
    }

    /// Last emitted snapshot. No side effects.
    #[must_use]
    pub const fn current_snapshot(&self) -> &RenderSnapshot {
        &self.snapshot
    }

    /// Deliver a fired timer. Timers that were canceled or replaced after
    /// firing are ignored and yield `None`.
    pub fn on_timer(&mut self, fired: FiredTimer) -> Option<RenderSnapshot> {
        if self.pending.get(&fired.slot) != Some(&fired.handle) {
            let mut entry = LogEntry::new(EventType::StaleTimer, Severity::Warning);
            entry.slot = Some(fired.slot.label().to_string());
            self.record(entry.details(format!("handle {} no longer armed", fired.handle.id())));
            return None;
        }
        self.pending.remove(&fired.slot);
        self.dispatch(DashboardMsg::TimerFired(fired.slot));
        Some(self.emit())
    }

    // ──────────────────── accessors ────────────────────

    #[must_use]
    pub const fn view_state(&self) -> ViewState {
        self.model.view.current()
    }

    #[must_use]
    pub const fn expansion_state(&self) -> ExpansionState {
        self.model.expansion.state()
    }

    #[must_use]
    pub const fn cards(&self) -> &CardSet {
        &self.model.cards
    }

    #[must_use]
    pub const fn timer(&self) -> &T {
        &self.timer
    }

    /// Slots with an armed timer.
    #[must_use]
    pub fn pending_slots(&self) -> Vec<TimerSlot> {
        let mut slots: Vec<TimerSlot> = self.pending.keys().copied().collect();
        slots.sort_by_key(|slot| slot.label());
        slots
    }

    // ──────────────────── internals ────────────────────

    fn dispatch(&mut self, msg: DashboardMsg) {
        let view_before = self.model.view.current();
        let phase_before = self.model.view.phase();
        let expansion_before = self.model.expansion.state();
        let restore_before = self.model.expansion.restore();

        let cmd = update(&mut self.model, msg);

        self.journal_transition(msg, view_before, phase_before, expansion_before, restore_before);
        self.execute(cmd);
    }

    fn execute(&mut self, cmd: DashboardCmd) {
        match cmd {
            DashboardCmd::None => {}
            DashboardCmd::Schedule { slot, after } => {
                if let Some(old) = self.pending.remove(&slot) {
                    self.timer.cancel(old);
                }
                let handle = self.timer.schedule(after, slot);
                self.pending.insert(slot, handle);
                let mut entry = LogEntry::new(EventType::TimerScheduled, Severity::Info);
                entry.slot = Some(slot.label().to_string());
                entry.after_ms = Some(duration_ms(after));
                self.record(entry);
            }
            DashboardCmd::Cancel(slot) => {
                if let Some(handle) = self.pending.remove(&slot) {
                    self.timer.cancel(handle);
                    let mut entry = LogEntry::new(EventType::TimerCanceled, Severity::Info);
                    entry.slot = Some(slot.label().to_string());
                    self.record(entry);
                }
            }
            DashboardCmd::Render => {
                let _ = self.emit();
            }
            DashboardCmd::Dispatch(msg) => self.dispatch(msg),
            DashboardCmd::Batch(cmds) => {
                for cmd in cmds {
                    self.execute(cmd);
                }
            }
        }
    }

    fn emit(&mut self) -> RenderSnapshot {
        let snapshot = self.model.snapshot();
        for observer in &mut self.observers {
            observer(&snapshot);
        }
        self.snapshot = snapshot.clone();
        snapshot
    }

    fn journal_transition(
        &mut self,
        msg: DashboardMsg,
        view_before: ViewState,
        phase_before: NormalPhase,
        expansion_before: ExpansionState,
        restore_before: Option<Restore>,
    ) {
        if self.journal.is_none() {
            return;
        }
        let view = &self.model.view;
        let view_after = view.current();
        let expansion_after = self.model.expansion.state();
        let epoch = view.revision();

        let entry = match msg {
            DashboardMsg::SetViewState(_) => {
                let mut e = LogEntry::new(EventType::ViewStateChange, Severity::Info)
                    .transition(view_before.label(), view_after.label());
                e.reveal_epoch = Some(epoch);
                Some(e)
            }
            DashboardMsg::TimerFired(TimerSlot::Revert) if view_after != view_before => {
                let mut e = LogEntry::new(EventType::AutoRevert, Severity::Info)
                    .transition(view_before.label(), view_after.label());
                e.origin = view.last_origin().map(|o| o.label().to_string());
                e.reveal_epoch = Some(epoch);
                Some(e)
            }
            DashboardMsg::TimerFired(TimerSlot::FadeWindow) if view.phase() != phase_before => {
                let mut e = LogEntry::new(EventType::FadeWindowClosed, Severity::Info);
                e.reveal_epoch = Some(epoch);
                Some(e)
            }
            DashboardMsg::TimerFired(slot @ (TimerSlot::Revert | TimerSlot::FadeWindow)) => {
                let mut e = LogEntry::new(EventType::StaleTimer, Severity::Warning)
                    .details(format!("no transition out of {}", view_after.label()));
                e.slot = Some(slot.label().to_string());
                Some(e)
            }
            DashboardMsg::ToggleCard(_) | DashboardMsg::TimerFired(TimerSlot::Settle)
                if expansion_after != expansion_before =>
            {
                let mut e = LogEntry::new(EventType::ExpansionChange, Severity::Info)
                    .transition(expansion_before.label(), expansion_after.label());
                e.card = expansion_after
                    .target()
                    .or_else(|| expansion_before.target())
                    .map(CardId::stagger_index);
                Some(e)
            }
            DashboardMsg::TimerFired(TimerSlot::Settle) => match self.model.expansion.restore() {
                Some(Restore::Releasing { card, .. })
                    if restore_before == Some(Restore::Holding(card)) =>
                {
                    let mut e = LogEntry::new(EventType::ExpansionChange, Severity::Info)
                        .details("other cards released");
                    e.card = Some(card.stagger_index());
                    Some(e)
                }
                _ => None,
            },
            DashboardMsg::ToggleCard(_) => None,
        };
        if let Some(entry) = entry {
            self.record(entry);
        }
    }

    fn record(&mut self, mut entry: LogEntry) {
        if let Some(journal) = self.journal.as_mut() {
            entry.clock_ms = self.timer.elapsed().map(duration_ms);
            journal.record(&entry);
        }
    }
}

impl<T: TimerService> Drop for Orchestrator<T> {
    fn drop(&mut self) {
        let armed: Vec<(TimerSlot, TimerHandle)> = self.pending.drain().collect();
        for (_, handle) in &armed {
            self.timer.cancel(*handle);
        }
        let entry = LogEntry::new(EventType::SessionEnd, Severity::Info)
            .details(format!("canceled {} pending timer(s)", armed.len()));
        self.record(entry);
        if let Some(journal) = self.journal.as_mut() {
            journal.flush();
        }
    }
}

impl Orchestrator<VirtualClock> {
    /// Session on a fresh virtual clock.
    pub fn simulated(config: &Config) -> Result<Self> {
        Self::from_config(config, VirtualClock::new())
    }

    /// Move the virtual clock forward, firing due timers in deadline order.
    /// Returns the snapshot emitted by each fired timer.
    pub fn advance(&mut self, by: Duration) -> Vec<RenderSnapshot> {
        let until = self.timer.now() + by;
        let mut emitted = Vec::new();
        while let Some(fired) = self.timer.pop_due(until) {
            if let Some(snapshot) = self.on_timer(fired) {
                emitted.push(snapshot);
            }
        }
        self.timer.set_now(until);
        emitted
    }

    /// Current virtual time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.timer.now()
    }
}

impl Orchestrator<ThreadTimer> {
    /// Wait up to `timeout` for one fired timer and apply it.
    ///
    /// `Ok(None)` means nothing fired in time or the timer was stale. A timer
    /// whose helper thread never started surfaces here as an error.
    pub fn pump(&mut self, timeout: Duration) -> Result<Option<RenderSnapshot>> {
        if let Some(error) = self.timer.take_error() {
            return Err(error);
        }
        let received = self.timer.receiver().recv_timeout(timeout);
        match received {
            Ok(fired) => Ok(self.on_timer(fired)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(DashError::ChannelClosed {
                component: "thread_timer",
            }),
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
