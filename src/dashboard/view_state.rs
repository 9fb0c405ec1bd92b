//! Display-state machine with timed auto-revert out of transient states.
//!
//! `Normal ⇄ {Loading, Skeleton, Error, Empty}` via explicit requests;
//! `Loading → Normal` and `Skeleton → Normal` additionally via the dwell timer.
//! A skeleton revert passes through the [`NormalPhase::FadingFromSkeleton`]
//! sub-state so content can cross-fade in with its own short profile.

use std::time::Duration;

use serde::Serialize;

use super::model::{DashboardCmd, TimerSlot, TransitionOrigin, ViewState};

/// Sub-state of `Normal`, kept separate from [`ViewState`] so the transition
/// table stays finite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalPhase {
    #[default]
    Settled,
    /// Skeleton just ended; cards are held hidden until the fade window closes.
    FadingFromSkeleton,
}

/// Owns the active [`ViewState`], its fade sub-state and the reveal origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewStateMachine {
    current: ViewState,
    phase: NormalPhase,
    last_origin: Option<TransitionOrigin>,
    /// Bumped on every observable view change; renderers restart reveals on it.
    revision: u64,
    dwell: Duration,
    fade_window: Duration,
}

impl ViewStateMachine {
    #[must_use]
    pub fn new(dwell: Duration, fade_window: Duration) -> Self {
        Self {
            current: ViewState::Normal,
            phase: NormalPhase::Settled,
            last_origin: None,
            revision: 0,
            dwell,
            fade_window,
        }
    }

    #[must_use]
    pub const fn current(&self) -> ViewState {
        self.current
    }

    #[must_use]
    pub const fn phase(&self) -> NormalPhase {
        self.phase
    }

    #[must_use]
    pub fn is_fading_from_skeleton(&self) -> bool {
        self.phase == NormalPhase::FadingFromSkeleton
    }

    #[must_use]
    pub const fn last_origin(&self) -> Option<TransitionOrigin> {
        self.last_origin
    }

    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Explicit request. Any state may follow any other, including itself.
    ///
    /// Pending revert and fade-window timers are always canceled first, so a
    /// stale dwell can never pull the view out of a state the caller chose.
    pub fn set(&mut self, next: ViewState) -> DashboardCmd {
        let mut cmds = vec![
            DashboardCmd::Cancel(TimerSlot::Revert),
            DashboardCmd::Cancel(TimerSlot::FadeWindow),
        ];
        self.current = next;
        self.phase = NormalPhase::Settled;
        self.last_origin = None;
        self.revision += 1;
        if next.is_transient() {
            cmds.push(DashboardCmd::Schedule {
                slot: TimerSlot::Revert,
                after: self.dwell,
            });
        }
        DashboardCmd::Batch(cmds)
    }

    /// Dwell timer fired. Only reachable through [`TimerSlot::Revert`].
    pub fn revert(&mut self) -> DashboardCmd {
        match self.current {
            ViewState::Skeleton => {
                self.last_origin = Some(TransitionOrigin::FromSkeleton);
                self.current = ViewState::Normal;
                self.phase = NormalPhase::FadingFromSkeleton;
                self.revision += 1;
                DashboardCmd::Schedule {
                    slot: TimerSlot::FadeWindow,
                    after: self.fade_window,
                }
            }
            ViewState::Loading => {
                self.last_origin = Some(TransitionOrigin::FromLoading);
                self.current = ViewState::Normal;
                self.revision += 1;
                DashboardCmd::None
            }
            // An explicit request already canceled this timer.
            ViewState::Normal | ViewState::Error | ViewState::Empty => DashboardCmd::None,
        }
    }

    /// Fade-window timer fired: release the cards into the from-skeleton reveal.
    pub fn end_fade_window(&mut self) -> DashboardCmd {
        if self.phase == NormalPhase::FadingFromSkeleton {
            self.phase = NormalPhase::Settled;
            self.revision += 1;
        }
        DashboardCmd::None
    }
}
