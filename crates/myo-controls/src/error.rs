//! Error types for control operations.

use thiserror::Error;

/// Result type for control operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Invalid argument provided to a control function.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Non-positive or non-finite controller time step.
    #[error("Invalid time step: dt = {dt}")]
    InvalidTimestep { dt: f64 },
}

impl From<myo_core::MyoError> for ControlError {
    fn from(e: myo_core::MyoError) -> Self {
        match e {
            myo_core::MyoError::NonFinite { what, .. }
            | myo_core::MyoError::InvalidArg { what } => ControlError::InvalidArg { what },
        }
    }
}
