//! Property-based tests for orchestrator invariants.
//!
//! Arbitrary interleavings of view-state requests, card toggles and clock
//! advances must keep the snapshot consistent: one active state, at most one
//! expanded card, suppressed cards never interactable, monotonic stagger, no
//! card fading in while the overlay shrinks, and no stale revert after an
//! explicit request.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use proptest::prelude::*;

use super::model::{CardId, CardSet, ExpansionState, TimerSlot, ViewState};
use super::orchestrator::Orchestrator;
use super::snapshot::RenderSnapshot;
use super::timer::VirtualClock;
use crate::core::config::{RevealConfig, TimingConfig};

// ──────────────────── strategies ────────────────────

#[derive(Debug, Clone, Copy)]
enum Op {
    Set(ViewState),
    Toggle(usize),
    Wait(u64),
}

fn arb_view_state() -> impl Strategy<Value = ViewState> {
    prop::sample::select(ViewState::ALL.to_vec())
}

fn arb_op(cards: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_view_state().prop_map(Op::Set),
        (0..cards).prop_map(Op::Toggle),
        (0u64..4000).prop_map(Op::Wait),
    ]
}

fn fresh(cards: usize) -> Orchestrator<VirtualClock> {
    Orchestrator::new(
        CardSet::new(cards).unwrap(),
        TimingConfig::default(),
        RevealConfig::default(),
        VirtualClock::new(),
    )
}

fn apply(o: &mut Orchestrator<VirtualClock>, op: Op) -> Vec<RenderSnapshot> {
    match op {
        Op::Set(state) => vec![o.set_view_state(state)],
        Op::Toggle(index) => vec![o.toggle_card(CardId::new(index)).unwrap()],
        Op::Wait(ms) => o.advance(Duration::from_millis(ms)),
    }
}

// ──────────────────── invariant checks ────────────────────

fn assert_snapshot_invariants(s: &RenderSnapshot, suppressed_opacity: f32) {
    // At most one card referenced by the expansion; overlay agrees.
    let target = s.expansion.target();
    match s.expansion {
        ExpansionState::Expanded(id) => assert_eq!(s.overlay.visible_card, Some(id)),
        _ => assert_eq!(s.overlay.visible_card, None),
    }
    assert_eq!(s.overlay_visible, target.is_some());

    for card in &s.cards {
        assert!(
            (0.0..=1.0).contains(&card.opacity()),
            "{} opacity {} out of range",
            card.id,
            card.opacity()
        );
        if target.is_some_and(|t| t != card.id) {
            assert!(!card.interactable, "suppressed {} is interactable", card.id);
            assert!(card.opacity() <= suppressed_opacity + 1e-6);
        }
        if s.view_state != ViewState::Normal || s.fading_from_skeleton {
            assert!(!card.interactable, "{} interactable outside Normal", card.id);
        }
    }

    // Stagger delays never decrease with index during a reveal.
    if s.view_state == ViewState::Normal && !s.fading_from_skeleton && target.is_none() {
        for pair in s.cards.windows(2) {
            assert!(
                pair[0].render.transition.delay_ms <= pair[1].render.transition.delay_ms,
                "stagger not monotonic between {} and {}",
                pair[0].id,
                pair[1].id
            );
        }
    }
}

/// While the overlay shrinks, no card may be on its way back in.
fn assert_no_overlapping_collapse(frames: &[RenderSnapshot]) {
    for pair in frames.windows(2) {
        if pair[1].overlay.progress < pair[0].overlay.progress {
            for card in &pair[1].cards {
                assert!(
                    card.opacity() <= card.render.from_opacity + 1e-6,
                    "{} fades in while the overlay shrinks",
                    card.id
                );
            }
        }
    }
}

// ──────────────────── property tests ────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every emitted snapshot satisfies the invariants, and the cached
    /// snapshot always matches the live state.
    #[test]
    fn arbitrary_sequences_preserve_invariants(
        cards in 1usize..7,
        seed_ops in prop::collection::vec(arb_op(6), 1..40)
    ) {
        let mut o = fresh(cards);
        let frames: Rc<RefCell<Vec<RenderSnapshot>>> =
            Rc::new(RefCell::new(vec![o.current_snapshot().clone()]));
        let sink = Rc::clone(&frames);
        o.subscribe(move |s| sink.borrow_mut().push(s.clone()));
        let suppressed = TimingConfig::default().suppressed_opacity;
        for op in seed_ops {
            let op = match op {
                Op::Toggle(i) => Op::Toggle(i % cards),
                other => other,
            };
            for s in apply(&mut o, op) {
                assert_snapshot_invariants(&s, suppressed);
            }
            let current = o.current_snapshot();
            prop_assert_eq!(current.view_state, o.view_state());
            prop_assert_eq!(current.expansion, o.expansion_state());
            prop_assert!(o.timer().pending() <= TimerSlot::ALL.len());
            prop_assert_eq!(o.timer().pending(), o.pending_slots().len());
        }
        assert_no_overlapping_collapse(&frames.borrow());
    }

    /// A stable state chosen explicitly is never left by a timer.
    #[test]
    fn stable_states_survive_any_wait(
        prefix in prop::collection::vec(arb_op(4), 0..20),
        stable in prop::sample::select(vec![ViewState::Normal, ViewState::Error, ViewState::Empty]),
        toggles in prop::collection::vec(0usize..4, 0..5),
        wait in 0u64..20_000,
    ) {
        let mut o = fresh(4);
        for op in prefix {
            let _ = apply(&mut o, op);
        }
        let _ = o.set_view_state(stable);
        for index in toggles {
            let _ = o.toggle_card(CardId::new(index)).unwrap();
        }
        let _ = o.advance(Duration::from_millis(wait));
        prop_assert_eq!(o.view_state(), stable);
    }

    /// A transient state lasts exactly the dwell, however it was reached.
    #[test]
    fn transient_states_revert_after_dwell(
        prefix in prop::collection::vec(arb_op(4), 0..20),
        transient in prop::sample::select(vec![ViewState::Loading, ViewState::Skeleton]),
    ) {
        let mut o = fresh(4);
        for op in prefix {
            let _ = apply(&mut o, op);
        }
        let _ = o.set_view_state(transient);
        let _ = o.advance(Duration::from_millis(2999));
        prop_assert_eq!(o.view_state(), transient);
        let _ = o.advance(Duration::from_millis(1));
        prop_assert_eq!(o.view_state(), ViewState::Normal);
    }

    /// Toggling the same card twice always returns to `Collapsed`.
    #[test]
    fn double_toggle_collapses(
        prefix in prop::collection::vec(arb_op(4), 0..20),
        index in 0usize..4,
        gap in 0u64..500,
    ) {
        let mut o = fresh(4);
        for op in prefix {
            let _ = apply(&mut o, op);
        }
        let first = o.toggle_card(CardId::new(index)).unwrap();
        prop_assume!(first.expansion.target() == Some(CardId::new(index)));
        let _ = o.advance(Duration::from_millis(gap));
        let s = o.toggle_card(CardId::new(index)).unwrap();
        prop_assert_eq!(s.expansion, ExpansionState::Collapsed);
        prop_assert!(s.overlay.visible_card.is_none());
    }
}
