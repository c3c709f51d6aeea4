//! Coupled motor, gear and spindle dynamics.
//!
//! State `x = [i, ω]`: motor current (A) and spindle angular velocity (rad/s).
//!
//! ```text
//! J      = J_motor + J_gear
//! di/dt  = (V - R·i - Ke·n·ω) / L
//! dω/dt  = kt·i / (n·J) - r·F / (n²·J·η̃)
//! ```
//!
//! where `n` is the gear ratio, `r` the spindle radius, `F` the elastic force
//! held constant over a tick and `η̃` the direction-dependent efficiency.
//!
//! ## Stability bound
//!
//! Explicit RK4 is only stable for `|λ·h| ≲ 2.8`. The fastest modes of this
//! system are bounded by the electrical time constant `τe = L/R` and the
//! electromechanical time constant `τm = R·J/(kt·Ke)`; each tick is split into
//! equal sub-steps no longer than `0.5 · min(τe, τm)`.

use crate::error::{ActuatorError, ActuatorResult};
use crate::integrator::{Integrator, Rk4};
use crate::model::TransientModel;
use crate::params::{Gear, Motor, Spindle};
use nalgebra::Vector2;
use tracing::warn;

/// Fraction of the smallest time constant used as the sub-step bound.
pub const STABILITY_FRACTION: f64 = 0.5;

/// Upper limit on sub-steps for a single tick.
pub const MAX_SUBSTEPS: usize = 1_000_000;

/// Gear efficiency as seen by the load.
///
/// Returns `efficiency` when the spindle turns forward (`ω >= 0`, including
/// exactly zero) and `1 / efficiency` when it is back-driven.
pub fn efficiency_approximation(efficiency: f64, angular_velocity: f64) -> f64 {
    if angular_velocity >= 0.0 {
        efficiency
    } else {
        1.0 / efficiency
    }
}

/// Mutable actuator state.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuatorState {
    /// Continuous ODE state `[current, spindle angular velocity]`.
    pub x: Vector2<f64>,
    /// Accumulated spindle angle (rad).
    pub spindle_angle: f64,
    /// Elastic force used for the last step (N).
    pub elastic_force: f64,
}

impl Default for ActuatorState {
    fn default() -> Self {
        Self {
            x: Vector2::zeros(),
            spindle_angle: 0.0,
            elastic_force: 0.0,
        }
    }
}

impl ActuatorState {
    pub fn current(&self) -> f64 {
        self.x[0]
    }

    pub fn spindle_velocity(&self) -> f64 {
        self.x[1]
    }
}

/// Right-hand side of the drive train ODE for fixed inputs.
#[derive(Debug, Clone)]
pub struct DriveTrain<'a> {
    pub motor: &'a Motor,
    pub gear: &'a Gear,
    pub spindle: &'a Spindle,
    /// Terminal voltage (V)
    pub voltage: f64,
    /// Load from the series elastic element (N)
    pub elastic_force: f64,
    /// Direction-dependent gear efficiency
    pub app_efficiency: f64,
}

impl DriveTrain<'_> {
    fn total_inertia(&self) -> f64 {
        self.motor.inertia + self.gear.inertia
    }
}

impl TransientModel for DriveTrain<'_> {
    type State = Vector2<f64>;

    fn rhs(&mut self, _t: f64, x: &Self::State) -> ActuatorResult<Self::State> {
        let m = self.motor;
        let n = self.gear.ratio;
        let j = self.total_inertia();

        let di = (self.voltage - m.resistance * x[0] - m.bemf_const * n * x[1]) / m.inductance;
        let domega = m.torque_const * x[0] / (n * j)
            - self.spindle.radius * self.elastic_force / (n * n * j * self.app_efficiency);

        if !di.is_finite() {
            return Err(ActuatorError::NumericalInstability {
                what: "current derivative",
                value: di,
            });
        }
        if !domega.is_finite() {
            return Err(ActuatorError::NumericalInstability {
                what: "spindle acceleration",
                value: domega,
            });
        }
        Ok(Vector2::new(di, domega))
    }

    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State {
        a + b
    }

    fn scale(&self, a: &Self::State, scale: f64) -> Self::State {
        a * scale
    }
}

/// Outcome of one actuator step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// Number of RK4 sub-steps taken.
    pub substeps: usize,
    /// Length of each sub-step (s).
    pub substep: f64,
}

/// Stateful actuator: motor, gear and spindle integrated together.
#[derive(Debug, Clone)]
pub struct ActuatorDynamics {
    pub motor: Motor,
    pub gear: Gear,
    pub spindle: Spindle,
    state: ActuatorState,
}

impl ActuatorDynamics {
    /// Create an actuator at rest.
    ///
    /// # Errors
    /// `Configuration` if any parameter set is non-physical.
    pub fn new(motor: Motor, gear: Gear, spindle: Spindle) -> ActuatorResult<Self> {
        motor.validate()?;
        gear.validate()?;
        spindle.validate()?;
        let mut actuator = Self {
            motor,
            gear,
            spindle,
            state: ActuatorState::default(),
        };
        actuator.sync_params();
        Ok(actuator)
    }

    pub fn state(&self) -> &ActuatorState {
        &self.state
    }

    /// Zero the continuous state and the accumulated spindle angle.
    pub fn reset(&mut self) {
        self.state = ActuatorState::default();
        self.sync_params();
    }

    /// Efficiency for the current rotation direction.
    pub fn efficiency_approximation(&self) -> f64 {
        efficiency_approximation(self.gear.efficiency, self.state.spindle_velocity())
    }

    /// Tendon length wound onto the spindle since initialization (m).
    pub fn spooled_length(&self) -> f64 {
        self.state.spindle_angle * self.spindle.radius
    }

    /// Longest stable RK4 sub-step (s).
    pub fn max_substep(&self) -> f64 {
        let m = &self.motor;
        let tau_e = m.inductance / m.resistance;
        let j = m.inertia + self.gear.inertia;
        let tau_m = m.resistance * j / (m.torque_const * m.bemf_const);
        STABILITY_FRACTION * tau_e.min(tau_m)
    }

    /// Advance the actuator by `period` seconds.
    ///
    /// `voltage` and `elastic_force` are held constant over the period. A
    /// period of zero leaves the state untouched.
    ///
    /// # Errors
    /// - `InvalidTimestep` if `period` is negative or non-finite.
    /// - `NumericalInstability` if the state diverges; the state is then left
    ///   exactly as it was before the call.
    pub fn step(
        &mut self,
        voltage: f64,
        elastic_force: f64,
        period: f64,
    ) -> ActuatorResult<StepReport> {
        if !period.is_finite() || period < 0.0 {
            return Err(ActuatorError::InvalidTimestep { dt: period });
        }
        if period == 0.0 {
            return Ok(StepReport {
                substeps: 0,
                substep: 0.0,
            });
        }

        let h_max = self.max_substep();
        let mut substeps = (period / h_max).ceil().max(1.0) as usize;
        if substeps > MAX_SUBSTEPS {
            warn!(
                period,
                h_max, "actuator tick exceeds sub-step budget, clamping sub-step count"
            );
            substeps = MAX_SUBSTEPS;
        }
        let h = period / substeps as f64;

        let mut x = self.state.x;
        let mut angle = self.state.spindle_angle;
        let mut app_efficiency = self.gear.app_efficiency;
        let mut t = 0.0;

        for _ in 0..substeps {
            app_efficiency = efficiency_approximation(self.gear.efficiency, x[1]);
            let mut model = DriveTrain {
                motor: &self.motor,
                gear: &self.gear,
                spindle: &self.spindle,
                voltage,
                elastic_force,
                app_efficiency,
            };
            // Errors return before any field is written, which freezes the state.
            let next = Rk4.step(&mut model, t, &x, h)?;
            if let Some(bad) = next.iter().copied().find(|v| !v.is_finite()) {
                return Err(ActuatorError::NumericalInstability {
                    what: "actuator state",
                    value: bad,
                });
            }
            angle += 0.5 * (x[1] + next[1]) * h;
            x = next;
            t += h;
        }

        if !angle.is_finite() {
            return Err(ActuatorError::NumericalInstability {
                what: "spindle angle",
                value: angle,
            });
        }

        self.state = ActuatorState {
            x,
            spindle_angle: angle,
            elastic_force,
        };
        self.motor.voltage = voltage;
        self.gear.app_efficiency = app_efficiency;
        self.sync_params();

        Ok(StepReport {
            substeps,
            substep: h,
        })
    }

    /// Mirror the continuous state into the parameter structs.
    fn sync_params(&mut self) {
        self.motor.current = self.state.current();
        self.spindle.ang_vel = self.state.spindle_velocity();
    }
}
