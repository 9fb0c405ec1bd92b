//! Dashboard view-state and card-expansion orchestration.
//!
//! Layout follows the model/update/command split: [`model`] holds state and
//! message types, [`update`] routes messages to the two state machines
//! ([`view_state`], [`expansion`]), [`reveal`] and [`snapshot`] derive what a
//! renderer should paint, and [`orchestrator`] runs commands against a
//! [`timer`] service.

#![allow(missing_docs)]

pub mod expansion;
pub mod model;
pub mod orchestrator;
pub mod reveal;
pub mod snapshot;
pub mod timer;
pub mod update;
pub mod view_state;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod test_properties;

pub use model::{CardId, CardSet, ExpansionState, TransitionOrigin, ViewState};
pub use orchestrator::Orchestrator;
pub use snapshot::RenderSnapshot;
