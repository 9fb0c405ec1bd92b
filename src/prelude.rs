//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use dashview::prelude::*;
//! ```

// Core
pub use crate::core::config::{Config, RevealConfig, TimingConfig};
pub use crate::core::errors::{DashError, Result};

// Dashboard
pub use crate::dashboard::model::{CardId, CardSet, ExpansionState, TransitionOrigin, ViewState};
pub use crate::dashboard::orchestrator::{Orchestrator, SnapshotObserver};
pub use crate::dashboard::reveal::{CardRender, Easing, RevealProfile, Transition};
pub use crate::dashboard::snapshot::{CardSnapshot, ExpansionOverlay, RenderSnapshot};
pub use crate::dashboard::timer::{FiredTimer, ThreadTimer, TimerHandle, TimerService, VirtualClock};

// Journal
pub use crate::logger::jsonl::{JsonlConfig, JsonlWriter, LogEntry};
pub use crate::logger::{Journal, MemoryJournal};
