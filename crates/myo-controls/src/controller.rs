//! Discrete PID position controller.
//!
//! The controller turns a commanded tendon position into a motor voltage.
//! Every update:
//! - clamps the setpoint to `[-sp_neg_max, sp_pos_max]`
//! - accumulates a bounded integral (anti-windup)
//! - clamps the output to `[output_neg_max, output_pos_max]`
//!
//! Integral bound: an explicit limit when configured, otherwise the integral
//! is held within `max(|output_neg_max|, output_pos_max) / |ki|`, i.e. the
//! integral term on its own never exceeds output saturation. With `ki == 0`
//! nothing is accumulated.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};

/// Controller gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidGains {
    /// Proportional gain (V/m).
    pub kp: f64,
    /// Integral gain (V/(m·s)).
    pub ki: f64,
    /// Derivative gain (V·s/m).
    pub kd: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 500.0,
            ki: 10.0,
            kd: 0.0,
        }
    }
}

/// PID controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PidController {
    pub gains: PidGains,
    /// Maximum output in the negative direction (must be negative).
    pub output_neg_max: f64,
    /// Maximum output in the positive direction (must be positive).
    pub output_pos_max: f64,
    /// Magnitude of the negative setpoint limit.
    pub sp_neg_max: f64,
    /// Positive setpoint limit.
    pub sp_pos_max: f64,
    /// Integral windup limit (optional). If None, derived from output limits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integral_limit: Option<f64>,
}

impl Default for PidController {
    fn default() -> Self {
        Self {
            gains: PidGains::default(),
            output_neg_max: -24.0,
            output_pos_max: 24.0,
            sp_neg_max: 100.0,
            sp_pos_max: 100.0,
            integral_limit: None,
        }
    }
}

impl PidController {
    /// Create a new PID controller.
    ///
    /// # Arguments
    ///
    /// * `gains` - Proportional, integral and derivative gains
    /// * `output_neg_max` - Most negative output, must be below zero
    /// * `output_pos_max` - Most positive output, must be above zero
    /// * `sp_neg_max` - Magnitude of the negative setpoint limit
    /// * `sp_pos_max` - Positive setpoint limit
    pub fn new(
        gains: PidGains,
        output_neg_max: f64,
        output_pos_max: f64,
        sp_neg_max: f64,
        sp_pos_max: f64,
    ) -> ControlResult<Self> {
        let controller = Self {
            gains,
            output_neg_max,
            output_pos_max,
            sp_neg_max,
            sp_pos_max,
            integral_limit: None,
        };
        controller.validate()?;
        Ok(controller)
    }

    /// Set integral windup limit.
    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit.abs());
        self
    }

    /// Check gains and clamp limits.
    pub fn validate(&self) -> ControlResult<()> {
        let PidGains { kp, ki, kd } = self.gains;
        if !(kp.is_finite() && ki.is_finite() && kd.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "gains must be finite",
            });
        }
        if !(self.output_neg_max < 0.0 && self.output_neg_max.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "output_neg_max must be negative",
            });
        }
        if !(self.output_pos_max > 0.0 && self.output_pos_max.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "output_pos_max must be positive",
            });
        }
        myo_core::ensure_positive(self.sp_neg_max, "sp_neg_max must be positive")?;
        myo_core::ensure_positive(self.sp_pos_max, "sp_pos_max must be positive")?;
        if let Some(limit) = self.integral_limit {
            myo_core::ensure_non_negative(limit, "integral_limit must be non-negative")?;
        }
        Ok(())
    }

    /// Bound applied to the integral accumulator.
    pub fn effective_integral_limit(&self) -> f64 {
        if let Some(limit) = self.integral_limit {
            return limit;
        }
        if self.gains.ki == 0.0 {
            return 0.0;
        }
        self.output_neg_max.abs().max(self.output_pos_max) / self.gains.ki.abs()
    }

    /// Clamp a setpoint to `[-sp_neg_max, sp_pos_max]`.
    pub fn clamp_setpoint(&self, setpoint: f64) -> f64 {
        setpoint.clamp(-self.sp_neg_max, self.sp_pos_max)
    }

    /// Compute controller output.
    ///
    /// # Arguments
    ///
    /// * `state` - Controller state (integral and last error)
    /// * `setpoint` - Commanded position
    /// * `measured` - Measured position
    /// * `dt` - Time since last update (seconds), must be positive
    ///
    /// # Returns
    ///
    /// Updated state and clamped output.
    pub fn calc_output(
        &self,
        state: &PidState,
        setpoint: f64,
        measured: f64,
        dt: f64,
    ) -> ControlResult<(PidState, f64)> {
        if !(dt > 0.0 && dt.is_finite()) {
            return Err(ControlError::InvalidTimestep { dt });
        }

        let setpoint = self.clamp_setpoint(setpoint);
        let error = setpoint - measured;

        let limit = self.effective_integral_limit();
        let integral = (state.integral + error * dt).clamp(-limit, limit);

        let derivative = (error - state.last_error) / dt;

        let PidGains { kp, ki, kd } = self.gains;
        let output_raw = kp * error + ki * integral + kd * derivative;
        // NaN from non-finite measurements must not escape the clamp
        let output = if output_raw.is_nan() {
            0.0
        } else {
            output_raw.clamp(self.output_neg_max, self.output_pos_max)
        };

        let new_state = PidState {
            integral,
            last_error: error,
        };

        Ok((new_state, output))
    }
}

/// PID controller state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PidState {
    /// Integral accumulator.
    pub integral: f64,
    /// Error from the previous update.
    pub last_error: f64,
}

impl PidState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
