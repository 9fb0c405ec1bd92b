//! Pure update function for the dashboard orchestrator.
//!
//! `update()` takes the current model and a message, mutates the model, and
//! returns a command describing the timer side-effects the orchestrator
//! should execute.
//!
//! **Design invariant:** this module arms no timers and performs zero I/O.

use super::model::{DashboardCmd, DashboardModel, DashboardMsg, TimerSlot};

/// Apply a message to the model and return the next command.
///
/// Card ids are validated by the caller; the update function trusts them.
pub fn update(model: &mut DashboardModel, msg: DashboardMsg) -> DashboardCmd {
    match msg {
        DashboardMsg::SetViewState(next) => model.view.set(next),
        DashboardMsg::ToggleCard(id) => model.expansion.toggle(id, model.view.revision()),
        DashboardMsg::TimerFired(TimerSlot::Revert) => model.view.revert(),
        DashboardMsg::TimerFired(TimerSlot::FadeWindow) => model.view.end_fade_window(),
        DashboardMsg::TimerFired(TimerSlot::Settle) => {
            model.expansion.settle(model.view.revision())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{RevealConfig, TimingConfig};
    use crate::dashboard::model::{CardId, CardSet, ExpansionState, ViewState};

    fn model() -> DashboardModel {
        DashboardModel::new(
            CardSet::standard(),
            TimingConfig::default(),
            RevealConfig::default(),
        )
    }

    #[test]
    fn view_and_expansion_are_independent() {
        let mut m = model();
        let _ = update(&mut m, DashboardMsg::ToggleCard(CardId::new(0)));
        let _ = update(&mut m, DashboardMsg::SetViewState(ViewState::Error));
        assert_eq!(m.view.current(), ViewState::Error);
        assert_eq!(
            m.expansion.state(),
            ExpansionState::CollapsingOthers(CardId::new(0))
        );
    }

    #[test]
    fn timer_messages_route_to_their_owner() {
        let mut m = model();
        let _ = update(&mut m, DashboardMsg::SetViewState(ViewState::Loading));
        let _ = update(&mut m, DashboardMsg::ToggleCard(CardId::new(3)));

        let _ = update(&mut m, DashboardMsg::TimerFired(TimerSlot::Settle));
        assert_eq!(m.view.current(), ViewState::Loading);
        assert_eq!(m.expansion.state(), ExpansionState::Expanded(CardId::new(3)));

        let _ = update(&mut m, DashboardMsg::TimerFired(TimerSlot::Revert));
        assert_eq!(m.view.current(), ViewState::Normal);
    }

    #[test]
    fn stray_fade_window_is_harmless() {
        let mut m = model();
        let before = m.view.clone();
        let cmd = update(&mut m, DashboardMsg::TimerFired(TimerSlot::FadeWindow));
        assert_eq!(cmd, DashboardCmd::None);
        assert_eq!(m.view, before);
    }
}
