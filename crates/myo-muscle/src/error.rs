//! Error types for muscle unit operations.

use crate::descriptor::DescriptorError;
use crate::geometry::GeometryError;
use myo_actuator::ActuatorError;
use myo_controls::ControlError;
use thiserror::Error;

/// Result type for muscle unit operations.
pub type MuscleResult<T> = Result<T, MuscleError>;

/// Errors raised by a muscle unit.
///
/// Recoverable errors leave the unit exactly as it was before the failing
/// update; the caller keeps applying the previous forces.
#[derive(Debug, Error)]
pub enum MuscleError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] DescriptorError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Actuator error: {0}")]
    Actuator(#[from] ActuatorError),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Via-point count mismatch: expected {expected}, got {got}")]
    ViaPointMismatch { expected: usize, got: usize },

    #[error("No pose for link '{link}'")]
    MissingLinkPose { link: String },

    #[error("Muscle '{name}' is faulted: {reason}")]
    Faulted { name: String, reason: FaultReason },
}

/// Why a unit stopped accepting updates.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FaultReason {
    #[error("non-positive update period {dt}")]
    InvalidTimestep { dt: f64 },

    #[error("actuator diverged on {streak} consecutive ticks")]
    Instability { streak: u32 },

    #[error("actuator step failed")]
    ActuatorFailure,
}

impl MuscleError {
    /// Whether the unit can continue with the next tick.
    pub fn is_recoverable(&self) -> bool {
        match self {
            MuscleError::Geometry(_)
            | MuscleError::ViaPointMismatch { .. }
            | MuscleError::MissingLinkPose { .. } => true,
            MuscleError::Actuator(ActuatorError::NumericalInstability { .. }) => true,
            MuscleError::Configuration(_)
            | MuscleError::Actuator(_)
            | MuscleError::Control(_)
            | MuscleError::Faulted { .. } => false,
        }
    }

    /// Whether the error stems from a malformed static configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            MuscleError::Configuration(_)
                | MuscleError::Actuator(ActuatorError::Configuration { .. })
                | MuscleError::Control(ControlError::InvalidArg { .. })
        )
    }
}
