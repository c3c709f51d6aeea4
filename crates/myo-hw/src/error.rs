//! Error types for hardware and control loop operations.

use myo_controls::ControlError;
use thiserror::Error;

/// Result type for hardware operations.
pub type HardwareResult<T> = Result<T, HardwareError>;

/// Errors raised by devices, controller managers and the loop itself.
#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("Unknown joint: {name}")]
    UnknownJoint { name: String },

    #[error("Device error: {what}")]
    Device { what: String },

    #[error("Invalid loop configuration: {what}")]
    InvalidConfig { what: &'static str },

    #[error("Control error: {0}")]
    Control(#[from] ControlError),
}

impl From<myo_core::MyoError> for HardwareError {
    fn from(e: myo_core::MyoError) -> Self {
        match e {
            myo_core::MyoError::NonFinite { what, .. }
            | myo_core::MyoError::InvalidArg { what } => HardwareError::InvalidConfig { what },
        }
    }
}
