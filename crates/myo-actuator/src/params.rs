//! Physical parameters of the motor, gear, spindle and series elastic element.
//!
//! Defaults describe the standard myo-muscle unit: a 24 V brushed DC motor on
//! a 53:1 planetary gear winding the tendon onto a 5.5 mm spindle.

use crate::error::{ActuatorError, ActuatorResult};
use myo_core::{ensure_finite, ensure_non_negative, ensure_positive};
use serde::{Deserialize, Serialize};

/// Electrical and mechanical constants of a DC motor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Motor {
    /// Armature current (A)
    pub current: f64,
    /// Torque constant (N·m/A)
    pub torque_const: f64,
    /// Terminal resistance (Ω)
    pub resistance: f64,
    /// Terminal inductance (H)
    pub inductance: f64,
    /// Applied voltage (V)
    pub voltage: f64,
    /// Back-EMF constant (V·s/rad)
    pub bemf_const: f64,
    /// Rotor moment of inertia (kg·m²)
    pub inertia: f64,
}

impl Default for Motor {
    fn default() -> Self {
        Self {
            current: 0.0,
            torque_const: 0.0335,
            resistance: 0.797,
            inductance: 0.118e-3,
            voltage: 0.0,
            bemf_const: 0.0335,
            inertia: 4.09e-6,
        }
    }
}

impl Motor {
    pub fn validate(&self) -> ActuatorResult<()> {
        ensure_positive(self.torque_const, "motor torque constant must be positive")?;
        ensure_positive(self.resistance, "motor resistance must be positive")?;
        ensure_positive(self.inductance, "motor inductance must be positive")?;
        ensure_positive(self.bemf_const, "motor back-EMF constant must be positive")?;
        ensure_positive(self.inertia, "motor inertia must be positive")?;
        ensure_finite(self.current, "motor current must be finite")?;
        ensure_finite(self.voltage, "motor voltage must be finite")?;
        Ok(())
    }
}

/// Reduction stage between motor and spindle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gear {
    /// Moment of inertia seen at the motor shaft (kg·m²)
    pub inertia: f64,
    /// Reduction ratio (motor turns per spindle turn)
    pub ratio: f64,
    /// Forward efficiency in (0, 1]
    pub efficiency: f64,
    /// Efficiency approximated from the last rotation direction
    pub app_efficiency: f64,
}

impl Default for Gear {
    fn default() -> Self {
        Self {
            inertia: 0.4e-6,
            ratio: 53.0,
            efficiency: 0.59,
            app_efficiency: 0.59,
        }
    }
}

impl Gear {
    pub fn validate(&self) -> ActuatorResult<()> {
        ensure_non_negative(self.inertia, "gear inertia must be non-negative")?;
        ensure_finite(self.ratio, "gear ratio must be finite")?;
        if self.ratio == 0.0 {
            return Err(ActuatorError::Configuration {
                what: "gear ratio must be non-zero",
            });
        }
        ensure_positive(self.efficiency, "gear efficiency must be in (0, 1]")?;
        if self.efficiency > 1.0 {
            return Err(ActuatorError::Configuration {
                what: "gear efficiency must be in (0, 1]",
            });
        }
        Ok(())
    }
}

/// Drum that winds the tendon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Spindle {
    /// Angular velocity (rad/s)
    pub ang_vel: f64,
    /// Winding radius (m)
    pub radius: f64,
}

impl Default for Spindle {
    fn default() -> Self {
        Self {
            ang_vel: 0.0,
            radius: 0.0055,
        }
    }
}

impl Spindle {
    pub fn validate(&self) -> ActuatorResult<()> {
        ensure_positive(self.radius, "spindle radius must be positive")?;
        Ok(())
    }
}

/// Series elastic element between spindle and tendon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesElastic {
    /// Spring constant (N/m)
    pub stiffness: f64,
    /// Length at initialization (m)
    pub length: f64,
    /// Unloaded length (m)
    pub rest_length: f64,
}

impl Default for SeriesElastic {
    fn default() -> Self {
        Self {
            stiffness: 30_680.0,
            length: 0.056,
            rest_length: 0.056,
        }
    }
}

impl SeriesElastic {
    pub fn validate(&self) -> ActuatorResult<()> {
        ensure_non_negative(self.stiffness, "SEE stiffness must be non-negative")?;
        ensure_non_negative(self.length, "SEE length must be non-negative")?;
        ensure_non_negative(self.rest_length, "SEE rest length must be non-negative")?;
        Ok(())
    }
}
