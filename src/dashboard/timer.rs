//! Timer services: schedule a one-shot event after a delay, cancel by handle.
//!
//! [`VirtualClock`] is deterministic and driven by explicit `advance` calls.
//! [`ThreadTimer`] uses wall-clock sleeps on helper threads and hands fired
//! events back over a channel, so all state mutation still happens on the
//! owner's thread.

use std::collections::{BTreeMap, HashSet};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

use super::model::TimerSlot;
use crate::core::errors::DashError;

/// Opaque identifier of one scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// A timer that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    pub handle: TimerHandle,
    pub slot: TimerSlot,
}

/// Host-provided scheduling capability.
pub trait TimerService {
    /// Arm a one-shot timer that delivers `slot` after `after`.
    fn schedule(&mut self, after: Duration, slot: TimerSlot) -> TimerHandle;

    /// Disarm a timer. Unknown or already-fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);

    /// Time since the service started, when the service tracks it.
    fn elapsed(&self) -> Option<Duration> {
        None
    }
}

// ──────────────────── virtual clock ────────────────────

/// Deterministic clock for tests and simulation.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now: Duration,
    next_id: u64,
    /// Keyed by `(deadline, handle)` so equal deadlines fire in schedule order.
    queue: BTreeMap<(Duration, TimerHandle), TimerSlot>,
}

impl VirtualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of armed timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Deadline of the earliest armed timer.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Pop the earliest timer due at or before `until`, moving `now` to its
    /// deadline. Returns `None` once nothing else is due.
    pub fn pop_due(&mut self, until: Duration) -> Option<FiredTimer> {
        let (&(deadline, handle), _) = self.queue.iter().next()?;
        if deadline > until {
            return None;
        }
        let slot = self.queue.remove(&(deadline, handle))?;
        self.now = self.now.max(deadline);
        Some(FiredTimer { handle, slot })
    }

    /// Move `now` forward without firing anything. Never moves backwards.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl TimerService for VirtualClock {
    fn schedule(&mut self, after: Duration, slot: TimerSlot) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.queue.insert((self.now + after, handle), slot);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.queue.retain(|(_, h), _| *h != handle);
    }

    fn elapsed(&self) -> Option<Duration> {
        Some(self.now)
    }
}

// ──────────────────── wall-clock timer ────────────────────

/// Wall-clock timer service. Each timer sleeps on its own helper thread.
///
/// Fired timers arrive on [`ThreadTimer::receiver`]; the owner drains it and
/// feeds them to the orchestrator. A helper thread that cannot be started
/// leaves its timer disarmed and is reported by [`ThreadTimer::take_error`].
#[derive(Debug)]
pub struct ThreadTimer {
    next_id: u64,
    live: Arc<Mutex<HashSet<TimerHandle>>>,
    tx: Sender<FiredTimer>,
    rx: Receiver<FiredTimer>,
    error: Option<DashError>,
}

impl Default for ThreadTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadTimer {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            next_id: 0,
            live: Arc::new(Mutex::new(HashSet::new())),
            tx,
            rx,
            error: None,
        }
    }

    /// Channel on which fired timers are delivered.
    #[must_use]
    pub fn receiver(&self) -> &Receiver<FiredTimer> {
        &self.rx
    }

    /// Number of timers armed and not yet fired or canceled.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.live.lock().len()
    }

    /// First helper-thread spawn failure since the last call, if any.
    pub fn take_error(&mut self) -> Option<DashError> {
        self.error.take()
    }

    pub(crate) fn record_spawn(
        &mut self,
        handle: TimerHandle,
        slot: TimerSlot,
        spawned: io::Result<()>,
    ) {
        if let Err(error) = spawned {
            self.live.lock().remove(&handle);
            self.error.get_or_insert(DashError::Runtime {
                details: format!("failed to spawn {} timer thread: {error}", slot.label()),
            });
        }
    }
}

impl TimerService for ThreadTimer {
    fn schedule(&mut self, after: Duration, slot: TimerSlot) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.live.lock().insert(handle);

        let live = Arc::clone(&self.live);
        let tx = self.tx.clone();
        let spawned = thread::Builder::new()
            .name("dashview-timer".to_string())
            .spawn(move || {
                thread::sleep(after);
                // Removing under the lock decides the race with cancel().
                if live.lock().remove(&handle) {
                    let _ = tx.send(FiredTimer { handle, slot });
                }
            })
            .map(drop);
        self.record_spawn(handle, slot, spawned);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.live.lock().remove(&handle);
    }
}
