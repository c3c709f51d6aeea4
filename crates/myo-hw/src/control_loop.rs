//! Fixed-rate read → update → write loop.
//!
//! ```text
//! NotReady ──(device ready)──▶ Ready ──┐
//!    ▲                                 │ read, manager.update, write, sleep
//!    └────────(device lost)────────────┘
//! ```
//!
//! While not ready the loop never touches `read`/`write`: it logs a throttled
//! warning and idles for one period. Deadlines are absolute, so time spent
//! inside a cycle does not accumulate as drift. A shutdown request is honoured
//! between cycles only. A cycle that fails is logged, counted and skipped; only
//! the shutdown flag ends [`JointControlLoop::run`].

use crate::clock::Clock;
use crate::error::{HardwareError, HardwareResult};
use crate::hardware::RobotHardware;
use crate::manager::ControllerManager;
use myo_controls::{SampleClock, SampleConfig};
use myo_core::Throttle;
use myo_core::units::{Time, hz, period_of, seconds};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// Loop pacing and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Cycle rate (Hz).
    pub rate_hz: f64,
    /// Minimum spacing of "not ready" warnings (s).
    pub not_ready_warn_interval_s: f64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            rate_hz: 10.0,
            not_ready_warn_interval_s: 1.0,
        }
    }
}

impl LoopConfig {
    pub fn validate(&self) -> HardwareResult<()> {
        if !(self.rate_hz > 0.0 && self.rate_hz.is_finite()) {
            return Err(HardwareError::InvalidConfig {
                what: "rate_hz must be positive",
            });
        }
        myo_core::ensure_non_negative(
            self.not_ready_warn_interval_s,
            "not_ready_warn_interval_s must be non-negative",
        )?;
        Ok(())
    }

    /// Nominal cycle period.
    pub fn period(&self) -> Time {
        period_of(hz(self.rate_hz))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    NotReady,
    Ready,
}

/// What a single call to [`JointControlLoop::run_cycle`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Device not ready; no read or write happened.
    Idle,
    /// Full read/update/write cycle.
    Completed {
        time: f64,
        period: f64,
        /// The cycle finished after its deadline.
        overrun: bool,
    },
    /// The device or the manager failed part way through the cycle.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopStats {
    pub cycles: u64,
    pub idle_cycles: u64,
    pub overruns: u64,
    pub failed_cycles: u64,
}

pub struct JointControlLoop<H, M, C> {
    hardware: H,
    manager: M,
    clock: C,
    config: LoopConfig,
    state: LoopState,
    sample: SampleClock,
    previous_time: Option<f64>,
    stats: LoopStats,
    not_ready: Throttle,
    cycle_errors: Throttle,
}

impl<H, M, C> JointControlLoop<H, M, C>
where
    H: RobotHardware,
    M: ControllerManager,
    C: Clock,
{
    pub fn new(hardware: H, manager: M, clock: C, config: LoopConfig) -> HardwareResult<Self> {
        config.validate()?;
        let sample = SampleClock::new(SampleConfig::new(seconds(config.period()))?, clock.now());
        Ok(Self {
            hardware,
            manager,
            clock,
            config,
            state: LoopState::NotReady,
            sample,
            previous_time: None,
            stats: LoopStats::default(),
            not_ready: Throttle::new(config.not_ready_warn_interval_s),
            cycle_errors: Throttle::new(config.not_ready_warn_interval_s),
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut M {
        &mut self.manager
    }

    /// "Not ready" warnings swallowed since the last one was logged.
    pub fn suppressed_not_ready_warnings(&self) -> u64 {
        self.not_ready.suppressed()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_parts(self) -> (H, M, C) {
        (self.hardware, self.manager, self.clock)
    }

    /// Run one cycle, including the sleep to the next deadline.
    ///
    /// # Errors
    /// Whatever the device or the controller manager reports. The cycle is
    /// abandoned at that point without sleeping; see [`Self::tick`].
    pub fn run_cycle(&mut self) -> HardwareResult<CycleOutcome> {
        let now = self.clock.now();
        let dt = self.sample.config.dt;

        if !self.hardware.is_ready() {
            if self.state == LoopState::Ready {
                warn!(time = now, "hardware lost readiness");
                self.state = LoopState::NotReady;
                self.previous_time = None;
            }
            let suppressed = self.not_ready.suppressed();
            if self.not_ready.admit(now) {
                warn!(time = now, suppressed, "hardware not ready, idling");
            }
            self.stats.idle_cycles += 1;
            self.clock.sleep_until(now + dt);
            self.sample.reset(self.clock.now());
            return Ok(CycleOutcome::Idle);
        }

        if self.state == LoopState::NotReady {
            info!(time = now, rate_hz = self.config.rate_hz, "hardware ready");
            self.state = LoopState::Ready;
            self.not_ready.reset();
            self.sample.reset(now);
        }

        let period = self.previous_time.map_or(dt, |prev| now - prev);
        self.hardware.read(now, period)?;
        // The read consumed the time up to `now`, even if the cycle fails later.
        self.previous_time = Some(now);
        self.manager
            .update(self.hardware.joints_mut(), now, period)?;
        self.hardware.write(now, period)?;
        self.stats.cycles += 1;

        let deadline = self.sample.next_sample_time;
        let end = self.clock.now();
        let overrun = end > deadline;
        if overrun {
            self.stats.overruns += 1;
            debug!(time = now, late_by = end - deadline, "control cycle overran");
        } else {
            self.clock.sleep_until(deadline);
        }
        self.sample.advance(end);

        Ok(CycleOutcome::Completed {
            time: now,
            period,
            overrun,
        })
    }

    /// Run one cycle and absorb its failure.
    ///
    /// A failed cycle is counted, logged at most once per warning interval,
    /// and still waits for its deadline so a persistent fault cannot spin.
    pub fn tick(&mut self) -> CycleOutcome {
        match self.run_cycle() {
            Ok(outcome) => outcome,
            Err(e) => {
                self.stats.failed_cycles += 1;
                let now = self.clock.now();
                let suppressed = self.cycle_errors.suppressed();
                if self.cycle_errors.admit(now) {
                    error!(time = now, error = %e, suppressed, "control cycle failed");
                }
                let deadline = self.sample.next_sample_time;
                if now < deadline {
                    self.clock.sleep_until(deadline);
                }
                self.sample.advance(self.clock.now());
                CycleOutcome::Failed
            }
        }
    }

    /// Cycle until `shutdown` is set. The flag is only checked between
    /// cycles, so a started cycle always finishes its write.
    pub fn run(&mut self, shutdown: &AtomicBool) -> LoopStats {
        while !shutdown.load(Ordering::Acquire) {
            self.tick();
        }
        info!(
            cycles = self.stats.cycles,
            idle = self.stats.idle_cycles,
            overruns = self.stats.overruns,
            failed = self.stats.failed_cycles,
            "control loop stopped"
        );
        self.stats
    }
}
