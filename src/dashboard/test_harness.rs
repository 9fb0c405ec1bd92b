//! Headless orchestrator harness for scripted interaction tests.
//!
//! Drives an [`Orchestrator`] on a [`VirtualClock`] and captures every emitted
//! snapshot, including the intermediate ones only observers see. Fully
//! deterministic: time moves only when a step says so.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut h = DashboardHarness::default();
//! h.set(ViewState::Skeleton);
//! h.wait_ms(3000);
//! assert!(h.last_frame().fading_from_skeleton);
//! ```

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::model::{CardId, CardSet, ExpansionState, ViewState};
use super::orchestrator::Orchestrator;
use super::snapshot::RenderSnapshot;
use super::timer::VirtualClock;
use crate::core::config::{RevealConfig, TimingConfig};
use crate::logger::MemoryJournal;
use crate::logger::jsonl::EventType;

/// Scriptable input step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessStep {
    Set(ViewState),
    Toggle(usize),
    WaitMs(u64),
}

/// Headless harness. Every command and every fired timer appends frames.
pub struct DashboardHarness {
    orchestrator: Orchestrator<VirtualClock>,
    frames: Rc<RefCell<Vec<RenderSnapshot>>>,
    journal: MemoryJournal,
}

impl Default for DashboardHarness {
    fn default() -> Self {
        Self::new(CardSet::standard(), TimingConfig::default())
    }
}

impl DashboardHarness {
    pub fn new(cards: CardSet, timing: TimingConfig) -> Self {
        let journal = MemoryJournal::new();
        let mut orchestrator =
            Orchestrator::new(cards, timing, RevealConfig::default(), VirtualClock::new())
                .with_journal(journal.clone());
        let frames: Rc<RefCell<Vec<RenderSnapshot>>> = Rc::default();
        let sink = Rc::clone(&frames);
        orchestrator.subscribe(move |s| sink.borrow_mut().push(s.clone()));
        Self {
            orchestrator,
            frames,
            journal,
        }
    }

    // ── Commands ──

    pub fn set(&mut self, state: ViewState) -> RenderSnapshot {
        self.orchestrator.set_view_state(state)
    }

    /// Toggle the card at `index`. Panics on an unknown card.
    pub fn toggle(&mut self, index: usize) -> RenderSnapshot {
        self.orchestrator
            .toggle_card(CardId::new(index))
            .expect("toggle on a card outside the harness card set")
    }

    pub fn wait_ms(&mut self, ms: u64) -> Vec<RenderSnapshot> {
        self.orchestrator.advance(Duration::from_millis(ms))
    }

    /// Replay a script of commands and waits.
    pub fn run_script(&mut self, steps: &[HarnessStep]) {
        for step in steps {
            match *step {
                HarnessStep::Set(state) => {
                    self.set(state);
                }
                HarnessStep::Toggle(index) => {
                    self.toggle(index);
                }
                HarnessStep::WaitMs(ms) => {
                    self.wait_ms(ms);
                }
            }
        }
    }

    // ── State queries ──

    pub fn view_state(&self) -> ViewState {
        self.orchestrator.view_state()
    }

    pub fn expansion(&self) -> ExpansionState {
        self.orchestrator.expansion_state()
    }

    pub fn current(&self) -> &RenderSnapshot {
        self.orchestrator.current_snapshot()
    }

    pub fn now(&self) -> Duration {
        self.orchestrator.now()
    }

    pub fn pending_timers(&self) -> usize {
        self.orchestrator.timer().pending()
    }

    pub fn orchestrator_mut(&mut self) -> &mut Orchestrator<VirtualClock> {
        &mut self.orchestrator
    }

    // ── Frame access ──

    pub fn last_frame(&self) -> RenderSnapshot {
        self.frames
            .borrow()
            .last()
            .cloned()
            .expect("no frames captured yet")
    }

    pub fn frames(&self) -> Vec<RenderSnapshot> {
        self.frames.borrow().clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Expansion state of every captured frame, consecutive duplicates removed.
    pub fn expansion_trace(&self) -> Vec<ExpansionState> {
        let mut trace: Vec<ExpansionState> =
            self.frames.borrow().iter().map(|f| f.expansion).collect();
        trace.dedup();
        trace
    }

    /// View state of every captured frame, consecutive duplicates removed.
    pub fn view_trace(&self) -> Vec<ViewState> {
        let mut trace: Vec<ViewState> =
            self.frames.borrow().iter().map(|f| f.view_state).collect();
        trace.dedup();
        trace
    }

    /// Journal event types recorded so far.
    pub fn journal_events(&self) -> Vec<EventType> {
        self.journal.entries().iter().map(|e| e.event).collect()
    }

    /// Compact, comparable trace of every captured frame.
    pub fn trace(&self) -> Vec<String> {
        self.frames
            .borrow()
            .iter()
            .map(|f| {
                format!(
                    "{}|fade={}|epoch={}/{}|{}",
                    f.view_state.label(),
                    f.fading_from_skeleton,
                    f.reveal_epoch,
                    f.expansion_epoch,
                    f.expansion.label()
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harness_starts_without_frames() {
        let h = DashboardHarness::default();
        assert_eq!(h.frame_count(), 0);
        assert_eq!(h.view_state(), ViewState::Normal);
        assert_eq!(h.journal_events(), vec![EventType::SessionStart]);
    }

    #[test]
    fn every_command_captures_a_frame() {
        let mut h = DashboardHarness::default();
        h.set(ViewState::Error);
        h.toggle(0);
        assert_eq!(h.frame_count(), 2);
        assert_eq!(h.last_frame().expansion, ExpansionState::CollapsingOthers(CardId::new(0)));
    }

    #[test]
    fn script_replay_is_deterministic() {
        let script = [
            HarnessStep::Set(ViewState::Skeleton),
            HarnessStep::Toggle(1),
            HarnessStep::WaitMs(100),
            HarnessStep::Toggle(3),
            HarnessStep::WaitMs(3200),
        ];
        let mut a = DashboardHarness::default();
        let mut b = DashboardHarness::default();
        a.run_script(&script);
        b.run_script(&script);
        assert_eq!(a.trace(), b.trace());
        assert_eq!(a.now(), Duration::from_millis(3300));
    }

    #[test]
    fn collapse_script_holds_then_releases() {
        let mut h = DashboardHarness::default();
        h.run_script(&[
            HarnessStep::Toggle(0),
            HarnessStep::WaitMs(50),
            HarnessStep::Toggle(0),
        ]);
        assert_eq!(h.pending_timers(), 1);
        let held = h.last_frame();
        h.wait_ms(300);
        let released = h.last_frame();
        assert_eq!(h.frame_count(), 4);
        assert_eq!(held.expansion, released.expansion);
        assert!(released.expansion_epoch > held.expansion_epoch);
        assert!(released.cards[1].opacity() > held.cards[1].opacity());
    }

    #[test]
    fn wait_without_timers_emits_nothing() {
        let mut h = DashboardHarness::default();
        assert!(h.wait_ms(10_000).is_empty());
        assert_eq!(h.frame_count(), 0);
    }
}
