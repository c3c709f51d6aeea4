//! Error types for actuator operations.

use thiserror::Error;

/// Errors encountered while evaluating or integrating the actuator model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActuatorError {
    #[error("Configuration error: {what}")]
    Configuration { what: &'static str },

    #[error("Invalid time step: {dt}")]
    InvalidTimestep { dt: f64 },

    #[error("Numerical instability in {what}: {value}")]
    NumericalInstability { what: &'static str, value: f64 },
}

pub type ActuatorResult<T> = Result<T, ActuatorError>;

impl From<myo_core::MyoError> for ActuatorError {
    fn from(e: myo_core::MyoError) -> Self {
        match e {
            myo_core::MyoError::NonFinite { what, .. }
            | myo_core::MyoError::InvalidArg { what } => ActuatorError::Configuration { what },
        }
    }
}
