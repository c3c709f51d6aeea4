//! Rate limiting for repeated diagnostics.
//!
//! Callers supply the current time in seconds (simulation time or a monotonic
//! clock), which keeps throttled logging deterministic under test.

/// Admits at most one event per `interval` seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct Throttle {
    interval: f64,
    next_allowed: Option<f64>,
    suppressed: u64,
}

impl Throttle {
    /// Create a throttle admitting one event per `interval_s` seconds.
    pub fn new(interval_s: f64) -> Self {
        Self {
            interval: interval_s.max(0.0),
            next_allowed: None,
            suppressed: 0,
        }
    }

    /// Returns `true` if an event at time `now` should be emitted.
    ///
    /// The first event is always admitted. Rejected events are counted and
    /// the count is reset on the next admitted one.
    pub fn admit(&mut self, now: f64) -> bool {
        match self.next_allowed {
            Some(next) if now < next => {
                self.suppressed += 1;
                false
            }
            _ => {
                self.next_allowed = Some(now + self.interval);
                self.suppressed = 0;
                true
            }
        }
    }

    /// Events rejected since the last admitted one.
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }

    /// Forget the last admission so the next event passes.
    pub fn reset(&mut self) {
        self.next_allowed = None;
        self.suppressed = 0;
    }
}
