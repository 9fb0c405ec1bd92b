#![forbid(unsafe_code)]

//! dashview: view-state and card-expansion orchestrator for multi-panel
//! analytics dashboards.
//!
//! The crate owns the timed state of a dashboard and hands out immutable
//! [`RenderSnapshot`](dashboard::RenderSnapshot)s; painting them is up to the
//! host.
//!
//! 1. **View states**: `Normal`, `Loading`, `Skeleton`, `Error`, `Empty`, with
//!    automatic revert out of the transient ones
//! 2. **Staggered reveal**: cold and from-skeleton timing profiles
//! 3. **Exclusive expansion**: one panel enlarged at a time, never two
//!    overlays animating together
//!
//! # Library usage
//!
//! ```rust,no_run
//! use dashview::prelude::*;
//!
//! let mut dash = Orchestrator::simulated(&Config::default())?;
//! dash.set_view_state(ViewState::Skeleton);
//! dash.advance(std::time::Duration::from_millis(3150));
//! # Ok::<(), DashError>(())
//! ```

pub mod prelude;

pub mod core;
pub mod dashboard;
pub mod logger;
