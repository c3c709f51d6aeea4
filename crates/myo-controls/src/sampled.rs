//! Deadline tracking for fixed-rate loops.
//!
//! Deadlines are absolute: the next one is always the previous deadline plus
//! one period, so time spent inside a cycle does not shift later cycles. A loop
//! that falls more than a full period behind is re-anchored to the present
//! rather than replaying the missed cycles back to back.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// Period of a fixed-rate loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sample period in seconds.
    pub dt: f64,
}

impl SampleConfig {
    /// `dt` must be positive and finite.
    pub fn new(dt: f64) -> ControlResult<Self> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "sample period must be positive",
            });
        }
        Ok(Self { dt })
    }
}

/// Next-deadline bookkeeping for a [`SampleConfig`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleClock {
    pub config: SampleConfig,
    /// Absolute time the next cycle is due.
    pub next_sample_time: f64,
}

impl SampleClock {
    /// First deadline one period after `start`.
    pub fn new(config: SampleConfig, start: f64) -> Self {
        Self {
            config,
            next_sample_time: start + config.dt,
        }
    }

    pub fn is_due(&self, now: f64) -> bool {
        now >= self.next_sample_time
    }

    /// Move to the following deadline after a cycle that ended at `now`.
    ///
    /// Returns `true` if `now` is already past that deadline, in which case
    /// the schedule restarts one period after `now`.
    pub fn advance(&mut self, now: f64) -> bool {
        self.next_sample_time += self.config.dt;
        if now > self.next_sample_time {
            self.reset(now);
            true
        } else {
            false
        }
    }

    /// Restart the schedule with the next deadline one period after `now`.
    pub fn reset(&mut self, now: f64) {
        self.next_sample_time = now + self.config.dt;
    }
}
