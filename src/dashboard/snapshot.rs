//! Immutable render snapshot handed to the presentation layer.

use serde::Serialize;

use super::expansion::Restore;
use super::model::{CardId, DashboardModel, ExpansionState, TransitionOrigin, ViewState};
use super::reveal::{self, CardRender, Easing, Transition};

/// Everything a renderer needs to paint one frame.
///
/// A renderer restarts each card from its `from_*` values whenever
/// `reveal_epoch` or `expansion_epoch` differs from the previous frame.
/// Otherwise it keeps what it shows and eases toward the new targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSnapshot {
    pub view_state: ViewState,
    pub fading_from_skeleton: bool,
    pub last_origin: Option<TransitionOrigin>,
    /// Changes whenever a new reveal should start from its `from_*` values.
    pub reveal_epoch: u64,
    /// Changes whenever panels are dimmed, held or released by an expansion.
    pub expansion_epoch: u64,
    /// Backdrop behind an enlarged (or enlarging) panel.
    pub overlay_visible: bool,
    pub cards: Vec<CardSnapshot>,
    pub expansion: ExpansionState,
    pub overlay: ExpansionOverlay,
}

/// One panel's visual state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardSnapshot {
    pub id: CardId,
    pub label: String,
    pub interactable: bool,
    pub render: CardRender,
}

impl CardSnapshot {
    #[must_use]
    pub const fn opacity(&self) -> f32 {
        self.render.opacity
    }

    #[must_use]
    pub const fn offset_px(&self) -> f32 {
        self.render.offset_px
    }
}

/// The enlarged panel layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExpansionOverlay {
    pub visible_card: Option<CardId>,
    /// 0 = not grown, 1 = full view.
    pub progress: f32,
    pub transition: Transition,
}

impl RenderSnapshot {
    #[must_use]
    pub fn card(&self, id: CardId) -> Option<&CardSnapshot> {
        self.cards.iter().find(|c| c.id == id)
    }

    /// Cards that currently accept pointer input.
    pub fn interactable_cards(&self) -> impl Iterator<Item = CardId> + '_ {
        self.cards.iter().filter(|c| c.interactable).map(|c| c.id)
    }
}

/// Derive a snapshot from the model.
pub(crate) fn build(model: &DashboardModel) -> RenderSnapshot {
    let view = &model.view;
    let expansion = model.expansion.state();
    let target = expansion.target();
    let fading = view.is_fading_from_skeleton();
    let accepts_input = view.current() == ViewState::Normal && !fading;
    let dim = model.timing.suppressed_opacity;
    let fade = Transition {
        delay_ms: 0,
        duration_ms: model.timing.settle_window_ms,
        easing: Easing::EaseOut,
    };
    // A release belongs to the reveal it started in; a new view state wins.
    let restore = match model.expansion.restore() {
        Some(Restore::Releasing { epoch, .. }) if epoch != view.revision() => None,
        other => other,
    };

    let cards = model
        .cards
        .ids()
        .map(|id| {
            let mut render = reveal::compute_card_render(
                id.stagger_index(),
                view.current(),
                view.last_origin(),
                fading,
                &model.reveal,
            );
            let suppressed = target.is_some_and(|t| t != id);
            let full = render.opacity;
            if suppressed {
                render.from_opacity = full;
                render.opacity = full * dim;
            } else if let Some(stage) = restore {
                render.opacity = match stage {
                    Restore::Holding(card) if card != id => full * dim,
                    _ => full,
                };
                render.from_opacity = match stage {
                    Restore::Releasing { card, .. } if card != id => full * dim,
                    _ => render.opacity,
                };
            }
            if suppressed || restore.is_some() {
                render.from_offset_px = render.offset_px;
                render.transition = fade;
            }
            CardSnapshot {
                id,
                label: model.cards.label(id).unwrap_or_default().to_string(),
                interactable: accepts_input && !suppressed,
                render,
            }
        })
        .collect();

    let grow = Transition {
        delay_ms: 0,
        duration_ms: model.timing.expand_duration_ms,
        easing: Easing::EaseInOut,
    };
    let overlay = match expansion {
        ExpansionState::Collapsed | ExpansionState::CollapsingOthers(_) => ExpansionOverlay {
            visible_card: None,
            progress: 0.0,
            transition: grow,
        },
        ExpansionState::Expanded(id) => ExpansionOverlay {
            visible_card: Some(id),
            progress: 1.0,
            transition: grow,
        },
    };

    RenderSnapshot {
        view_state: view.current(),
        fading_from_skeleton: fading,
        last_origin: view.last_origin(),
        reveal_epoch: view.revision(),
        expansion_epoch: model.expansion.revision(),
        overlay_visible: !expansion.is_collapsed(),
        cards,
        expansion,
        overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{RevealConfig, TimingConfig};
    use crate::dashboard::model::{CardSet, ViewState};

    fn model() -> DashboardModel {
        DashboardModel::new(
            CardSet::standard(),
            TimingConfig::default(),
            RevealConfig::default(),
        )
    }

    #[test]
    fn initial_snapshot_is_cold_normal() {
        let snap = model().snapshot();
        assert_eq!(snap.view_state, ViewState::Normal);
        assert_eq!(snap.cards.len(), 4);
        assert!(snap.cards.iter().all(|c| c.interactable));
        assert!(!snap.overlay_visible);
        assert_eq!(snap.overlay.visible_card, None);
        assert_eq!(snap.cards[0].label, "Revenue");
    }

    #[test]
    fn expansion_suppresses_other_cards() {
        let mut m = model();
        let target = CardId::new(1);
        let _ = m.expansion.toggle(target, 0);
        let snap = m.snapshot();
        assert!(snap.overlay_visible);
        assert_eq!(snap.interactable_cards().collect::<Vec<_>>(), vec![target]);
        for card in &snap.cards {
            if card.id == target {
                assert!((card.opacity() - 1.0).abs() < f32::EPSILON);
            } else {
                assert!(card.opacity() < 1.0);
            }
        }
        assert_eq!(snap.overlay.visible_card, None);

        let _ = m.expansion.settle(0);
        let snap = m.snapshot();
        assert_eq!(snap.overlay.visible_card, Some(target));
        assert!((snap.overlay.progress - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn collapse_holds_other_cards_until_overlay_has_shrunk() {
        let mut m = model();
        let target = CardId::new(2);
        let dim = m.timing.suppressed_opacity;
        let _ = m.expansion.toggle(target, 0);
        let _ = m.expansion.settle(0);
        let expanded = m.snapshot();

        let _ = m.expansion.toggle(target, 0);
        let shrinking = m.snapshot();
        assert!(shrinking.overlay.progress < expanded.overlay.progress);
        assert_eq!(shrinking.interactable_cards().count(), 4);
        assert!(shrinking.expansion_epoch > expanded.expansion_epoch);
        for card in shrinking.cards.iter().filter(|c| c.id != target) {
            assert!((card.opacity() - dim).abs() < f32::EPSILON, "{} not held", card.id);
            assert!((card.render.from_opacity - card.opacity()).abs() < f32::EPSILON);
        }

        let _ = m.expansion.settle(0);
        let released = m.snapshot();
        assert!(released.expansion_epoch > shrinking.expansion_epoch);
        assert_eq!(released.reveal_epoch, shrinking.reveal_epoch);
        for card in released.cards.iter().filter(|c| c.id != target) {
            assert!((card.render.from_opacity - dim).abs() < f32::EPSILON);
            assert!((card.opacity() - 1.0).abs() < f32::EPSILON);
            assert_eq!(card.render.transition.delay_ms, 0);
            assert_eq!(card.render.transition.duration_ms, m.timing.settle_window_ms);
        }
        let kept = released.card(target).unwrap();
        assert!((kept.render.from_opacity - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn release_yields_to_a_new_reveal() {
        let mut m = model();
        let target = CardId::new(0);
        let _ = m.expansion.toggle(target, m.view.revision());
        let _ = m.expansion.toggle(target, m.view.revision());
        let _ = m.view.set(ViewState::Normal);
        let snap = m.snapshot();
        // Back on the cold stagger, starting from hidden.
        assert_eq!(snap.cards[1].render.from_opacity, 0.0);
        assert!(snap.cards[1].render.transition.delay_ms > 0);
    }

    #[test]
    fn non_normal_states_disable_input() {
        for state in [
            ViewState::Loading,
            ViewState::Skeleton,
            ViewState::Error,
            ViewState::Empty,
        ] {
            let mut m = model();
            let _ = m.view.set(state);
            let snap = m.snapshot();
            assert_eq!(snap.interactable_cards().count(), 0, "{state:?}");
        }
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let json = serde_json::to_value(model().snapshot()).unwrap();
        assert_eq!(json["view_state"], "normal");
        assert_eq!(json["expansion"]["phase"], "collapsed");
        assert_eq!(json["cards"].as_array().map(Vec::len), Some(4));
    }
}
