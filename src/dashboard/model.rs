//! Elm-style state model for the dashboard view orchestrator.
//!
//! All display state lives in [`DashboardModel`]. Commands and timer events
//! arrive as [`DashboardMsg`] values; side-effects are represented as
//! [`DashboardCmd`] values returned from the update function.
//!
//! **Design invariant:** the model is deterministic: no timers
//! are armed and no I/O happens here.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::config::{RevealConfig, TimingConfig};
use crate::core::errors::{DashError, Result};
use crate::dashboard::expansion::ExpansionController;
use crate::dashboard::snapshot::{self, RenderSnapshot};
use crate::dashboard::view_state::ViewStateMachine;

// ──────────────────── view states ────────────────────

/// Display state of the whole multi-panel view. Exactly one is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    /// Real content is shown.
    #[default]
    Normal,
    /// Data is being fetched; auto-reverts to `Normal` after the dwell.
    Loading,
    /// Placeholder panels; auto-reverts to `Normal` after the dwell.
    Skeleton,
    /// A data failure banner is shown. Stable.
    Error,
    /// A no-data banner is shown. Stable.
    Empty,
}

impl ViewState {
    /// All states in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Normal,
        Self::Loading,
        Self::Skeleton,
        Self::Error,
        Self::Empty,
    ];

    /// Transient states carry a timed automatic exit back to `Normal`.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Loading | Self::Skeleton)
    }

    /// Lowercase label used in logs and CLI output.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Loading => "loading",
            Self::Skeleton => "skeleton",
            Self::Error => "error",
            Self::Empty => "empty",
        }
    }

    /// Parse a lowercase label. Returns `None` for unknown input.
    #[must_use]
    pub fn from_label(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|state| state.label().eq_ignore_ascii_case(raw.trim()))
    }
}

/// Which transient state the view last reverted out of.
///
/// Selects the reveal profile for the next `Normal` reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOrigin {
    FromLoading,
    FromSkeleton,
}

impl TransitionOrigin {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FromLoading => "from_loading",
            Self::FromSkeleton => "from_skeleton",
        }
    }
}

// ──────────────────── cards ────────────────────

/// Ordinal of one panel within a [`CardSet`]. Doubles as its stagger index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(usize);

impl CardId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position in the card set, used to offset reveal delays.
    #[must_use]
    pub const fn stagger_index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "card{}", self.0 + 1)
    }
}

/// The fixed panels of one dashboard, supplied at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSet {
    labels: Vec<String>,
}

impl CardSet {
    /// Panel titles of the analytics dashboard template.
    pub const STANDARD_LABELS: [&'static str; 4] =
        ["Revenue", "Active Users", "Conversion Rate", "Traffic Sources"];

    /// The four-panel analytics layout.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            labels: Self::STANDARD_LABELS.iter().map(|l| (*l).to_string()).collect(),
        }
    }

    /// `count` anonymous panels labelled `card1..cardN`.
    pub fn new(count: usize) -> Result<Self> {
        if count == 0 {
            return Err(DashError::InvalidCardSet {
                details: "a dashboard needs at least one card".to_string(),
            });
        }
        Ok(Self {
            labels: (0..count).map(|i| CardId::new(i).to_string()).collect(),
        })
    }

    /// Panels with explicit labels; stagger order follows the label order.
    pub fn with_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(DashError::InvalidCardSet {
                details: "a dashboard needs at least one card".to_string(),
            });
        }
        Ok(Self { labels })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        id.0 < self.labels.len()
    }

    /// Resolve an index to a card of this set.
    #[must_use]
    pub fn card(&self, index: usize) -> Option<CardId> {
        (index < self.labels.len()).then_some(CardId(index))
    }

    /// Card ids in stagger order.
    pub fn ids(&self) -> impl Iterator<Item = CardId> + '_ {
        (0..self.labels.len()).map(CardId)
    }

    #[must_use]
    pub fn label(&self, id: CardId) -> Option<&str> {
        self.labels.get(id.0).map(String::as_str)
    }

    /// Reject ids that do not belong to this set.
    pub fn check(&self, id: CardId) -> Result<CardId> {
        if self.contains(id) {
            Ok(id)
        } else {
            Err(DashError::UnknownCard {
                index: id.0,
                count: self.labels.len(),
            })
        }
    }
}

// ──────────────────── expansion ────────────────────

/// Which single panel, if any, owns the full-view overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "phase", content = "card", rename_all = "snake_case")]
pub enum ExpansionState {
    #[default]
    Collapsed,
    /// Non-target panels are fading out; the target has not started to grow.
    CollapsingOthers(CardId),
    Expanded(CardId),
}

impl ExpansionState {
    /// The one card referenced by a non-collapsed state.
    #[must_use]
    pub const fn target(self) -> Option<CardId> {
        match self {
            Self::Collapsed => None,
            Self::CollapsingOthers(id) | Self::Expanded(id) => Some(id),
        }
    }

    #[must_use]
    pub const fn is_collapsed(self) -> bool {
        matches!(self, Self::Collapsed)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Collapsed => "collapsed",
            Self::CollapsingOthers(_) => "collapsing_others",
            Self::Expanded(_) => "expanded",
        }
    }
}

// ──────────────────── timers ────────────────────

/// Named timer slots. At most one timer per slot is pending at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerSlot {
    /// Dwell expiry of a transient view state.
    Revert,
    /// End of the skeleton-to-content fade window.
    FadeWindow,
    /// End of the non-target fade-out before a panel expands.
    Settle,
}

impl TimerSlot {
    pub const ALL: [Self; 3] = [Self::Revert, Self::FadeWindow, Self::Settle];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Revert => "revert",
            Self::FadeWindow => "fade_window",
            Self::Settle => "settle",
        }
    }
}

// ──────────────────── messages ────────────────────

/// Inputs to the update function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardMsg {
    /// Explicit display-state request from the application.
    SetViewState(ViewState),
    /// Enlarge or shrink a panel.
    ToggleCard(CardId),
    /// A previously scheduled timer fired.
    TimerFired(TimerSlot),
}

// ──────────────────── commands ────────────────────

/// Side-effects returned by the update function for the orchestrator to run.
///
/// Commands in a `Batch` execute in order. The update function never touches
/// the timer service directly.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardCmd {
    /// No side-effect.
    None,
    /// Arm `slot`, replacing any timer already pending in it.
    Schedule { slot: TimerSlot, after: Duration },
    /// Disarm `slot` if a timer is pending.
    Cancel(TimerSlot),
    /// Emit a snapshot of the model as it is right now.
    Render,
    /// Feed another message through the update function immediately.
    Dispatch(DashboardMsg),
    /// Execute multiple commands.
    Batch(Vec<Self>),
}

impl DashboardCmd {
    /// Flatten nested batches into execution order.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::None => Vec::new(),
            Self::Batch(cmds) => cmds.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

// ──────────────────── model ────────────────────

/// Complete orchestrator state for one dashboard session.
#[derive(Debug, Clone)]
pub struct DashboardModel {
    pub cards: CardSet,
    pub timing: TimingConfig,
    pub reveal: RevealConfig,
    pub view: ViewStateMachine,
    pub expansion: ExpansionController,
}

impl DashboardModel {
    /// Fresh session: `Normal` view, nothing expanded.
    #[must_use]
    pub fn new(cards: CardSet, timing: TimingConfig, reveal: RevealConfig) -> Self {
        Self {
            view: ViewStateMachine::new(timing.transient_dwell(), timing.fade_window()),
            expansion: ExpansionController::new(timing.settle_window(), timing.expand_duration()),
            cards,
            timing,
            reveal,
        }
    }

    /// Build the render snapshot for the current state.
    #[must_use]
    pub fn snapshot(&self) -> RenderSnapshot {
        snapshot::build(self)
    }
}

// ──────────────────── tests ────────────────────
