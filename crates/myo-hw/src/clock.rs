//! Time sources for the control loop.

use std::time::{Duration, Instant};

/// Monotonic time in seconds plus absolute-deadline sleeping.
pub trait Clock {
    fn now(&self) -> f64;

    /// Block until `deadline`. Returns immediately if it already passed.
    fn sleep_until(&mut self, deadline: f64);
}

/// Wall clock measured from construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    fn sleep_until(&mut self, deadline: f64) {
        let remaining = deadline - self.now();
        if remaining > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(remaining));
        }
    }
}

/// Deterministic clock that only moves when told to.
///
/// `sleep_until` jumps straight to the deadline, so a loop driven by this
/// clock runs as fast as the host allows while seeing exact periods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualClock {
    now: f64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self { now: start }
    }

    pub fn advance(&mut self, dt: f64) {
        if dt > 0.0 {
            self.now += dt;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now
    }

    fn sleep_until(&mut self, deadline: f64) {
        if deadline > self.now {
            self.now = deadline;
        }
    }
}
