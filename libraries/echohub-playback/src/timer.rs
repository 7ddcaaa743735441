//! Clocks and the one-shot timer behind the volume slider auto-hide
//!
//! The controller never sleeps or spawns. It asks an injected [`Clock`] for
//! the current time and the host calls `tick()` to let due timers fire.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Monotonic time source, measured from an arbitrary origin
pub trait Clock {
    /// Time elapsed since the clock's origin
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`std::time::Instant`]
///
/// Not available on `wasm32-unknown-unknown`; the browser bindings provide
/// their own clock.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: std::time::Instant,
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock
///
/// Clones share the same time, so a test (or the replay harness) can keep
/// one handle while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    /// Jump to an absolute time (never moves backward)
    pub fn set(&self, to: Duration) {
        if to > self.now.get() {
            self.now.set(to);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Handle of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle {
    /// Unique per timer instance, increases with every restart
    pub id: u64,

    /// Clock time at which the timer fires
    pub deadline: Duration,
}

/// One-shot timer with at most one pending deadline
///
/// Restarting replaces the pending handle, so no matter how often it is
/// restarted only the latest deadline can fire.
#[derive(Debug, Clone, Default)]
pub struct OneShotTimer {
    pending: Option<TimerHandle>,
    next_id: u64,
}

impl OneShotTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the timer `delay` after `now`, cancelling any pending one
    pub fn restart(&mut self, now: Duration, delay: Duration) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle {
            id: self.next_id,
            deadline: now + delay,
        };
        self.pending = Some(handle);
        handle
    }

    /// Cancel the pending timer
    ///
    /// Returns true if a timer was pending
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Fire the timer if its deadline has passed
    ///
    /// Returns the fired handle; a handle fires at most once.
    pub fn poll(&mut self, now: Duration) -> Option<TimerHandle> {
        match self.pending {
            Some(handle) if now >= handle.deadline => self.pending.take(),
            _ => None,
        }
    }

    /// Currently pending handle
    pub fn pending(&self) -> Option<TimerHandle> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
