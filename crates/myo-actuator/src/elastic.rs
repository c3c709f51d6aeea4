//! Series elastic element force law.
//!
//! The spring is stretched by the difference between its current and rest
//! length plus the tendon wound onto the spindle during the elapsed time:
//!
//! ```text
//! winding      = spindle_radius * speed * time
//! displacement = (length - rest_length) + winding
//! force        = stiffness * max(displacement, 0)
//! ```
//!
//! A tendon cannot push, so a compressed element carries no force. The
//! winding term is continuous in `speed` and vanishes when `speed == 0`.

use crate::error::{ActuatorError, ActuatorResult};
use myo_core::{ensure_finite, ensure_non_negative};

/// Elastic force of the series elastic element (N).
///
/// # Arguments
///
/// * `rest_length` - Unloaded length of the element (m)
/// * `length` - Current length of the element (m)
/// * `stiffness` - Spring constant (N/m), must be non-negative
/// * `speed` - Spindle angular velocity (rad/s)
/// * `spindle_radius` - Winding radius (m), must be positive
/// * `time` - Elapsed time over which the spindle winds (s)
pub fn elastic_element_force(
    rest_length: f64,
    length: f64,
    stiffness: f64,
    speed: f64,
    spindle_radius: f64,
    time: f64,
) -> ActuatorResult<f64> {
    ensure_non_negative(stiffness, "SEE stiffness must be non-negative")?;
    if !(spindle_radius > 0.0 && spindle_radius.is_finite()) {
        return Err(ActuatorError::Configuration {
            what: "spindle radius must be positive",
        });
    }
    ensure_finite(rest_length, "SEE rest length must be finite")?;
    ensure_finite(length, "SEE length must be finite")?;
    ensure_finite(speed, "spindle speed must be finite")?;
    ensure_finite(time, "elapsed time must be finite")?;

    let winding = spindle_radius * speed * time;
    let displacement = (length - rest_length) + winding;
    if displacement > 0.0 {
        Ok(stiffness * displacement)
    } else {
        Ok(0.0)
    }
}
