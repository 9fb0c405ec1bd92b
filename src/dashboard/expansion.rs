//! Exclusive full-view expansion of a single panel.
//!
//! Expanding is staged: the other panels fade out during the settle window
//! (`CollapsingOthers`) and only then does the target grow (`Expanded`).
//! Collapsing runs the same stages in reverse: the target shrinks while the
//! other panels hold their dimmed look, and they fade back in only once the
//! shrink has finished. Switching targets fully collapses the current one
//! before the next begins, so two overlays are never animating at once.

use std::time::Duration;

use super::model::{CardId, DashboardCmd, DashboardMsg, ExpansionState, TimerSlot};

/// Where the other panels are on their way back after a collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restore {
    /// `card` is shrinking; the rest stay dimmed.
    Holding(CardId),
    /// The rest fade back in, starting in reveal epoch `epoch`.
    Releasing { card: CardId, epoch: u64 },
}

/// Owns the session's single [`ExpansionState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionController {
    state: ExpansionState,
    restore: Option<Restore>,
    settle: Duration,
    shrink: Duration,
    revision: u64,
}

impl ExpansionController {
    /// `settle` is the fade-out window before a grow, `shrink` the length of
    /// the overlay's collapse animation.
    #[must_use]
    pub fn new(settle: Duration, shrink: Duration) -> Self {
        Self {
            state: ExpansionState::Collapsed,
            restore: None,
            settle,
            shrink,
            revision: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ExpansionState {
        self.state
    }

    /// Restore stage after the last collapse, if any.
    #[must_use]
    pub const fn restore(&self) -> Option<Restore> {
        self.restore
    }

    /// Bumped on every visual change, including restore stages.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// `reveal_epoch` is the view's current revision; a release is only
    /// rendered within the epoch it started in.
    pub fn toggle(&mut self, id: CardId, reveal_epoch: u64) -> DashboardCmd {
        self.revision += 1;
        match self.state {
            ExpansionState::Collapsed => {
                self.state = ExpansionState::CollapsingOthers(id);
                self.restore = None;
                DashboardCmd::Schedule {
                    slot: TimerSlot::Settle,
                    after: self.settle,
                }
            }
            ExpansionState::Expanded(current) if current == id => {
                // Shrink first; the others come back when the settle slot fires.
                self.state = ExpansionState::Collapsed;
                self.restore = Some(Restore::Holding(id));
                DashboardCmd::Schedule {
                    slot: TimerSlot::Settle,
                    after: self.shrink,
                }
            }
            ExpansionState::CollapsingOthers(current) if current == id => {
                // Nothing has grown yet, so nothing needs to shrink.
                self.state = ExpansionState::Collapsed;
                self.restore = Some(Restore::Releasing {
                    card: id,
                    epoch: reveal_epoch,
                });
                DashboardCmd::Cancel(TimerSlot::Settle)
            }
            ExpansionState::CollapsingOthers(current) | ExpansionState::Expanded(current) => {
                // Show the fully collapsed frame, then start over from Collapsed.
                self.state = ExpansionState::Collapsed;
                self.restore = Some(Restore::Holding(current));
                DashboardCmd::Batch(vec![
                    DashboardCmd::Cancel(TimerSlot::Settle),
                    DashboardCmd::Render,
                    DashboardCmd::Dispatch(DashboardMsg::ToggleCard(id)),
                ])
            }
        }
    }

    /// Settle window elapsed: the target may now grow, or a shrunk target's
    /// neighbours may now come back.
    pub fn settle(&mut self, reveal_epoch: u64) -> DashboardCmd {
        match (self.state, self.restore) {
            (ExpansionState::CollapsingOthers(id), _) => {
                self.state = ExpansionState::Expanded(id);
                self.revision += 1;
            }
            (ExpansionState::Collapsed, Some(Restore::Holding(card))) => {
                self.restore = Some(Restore::Releasing {
                    card,
                    epoch: reveal_epoch,
                });
                self.revision += 1;
            }
            _ => {}
        }
        DashboardCmd::None
    }
}
