//! Electric motor force model.

use crate::error::{ActuatorError, ActuatorResult};

/// Tendon force produced by the motor current acting on the spindle.
///
/// `force = current × torque_constant / spindle_radius`
///
/// # Errors
///
/// `Configuration` if `spindle_radius` is not a positive finite number.
pub fn electric_motor_force(
    current: f64,
    torque_constant: f64,
    spindle_radius: f64,
) -> ActuatorResult<f64> {
    if !(spindle_radius > 0.0 && spindle_radius.is_finite()) {
        return Err(ActuatorError::Configuration {
            what: "spindle radius must be positive",
        });
    }
    Ok(current * torque_constant / spindle_radius)
}
