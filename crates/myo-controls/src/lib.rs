//! Control primitives for myo-muscle actuators.
//!
//! This crate provides the discrete-time pieces that sit between a commanded
//! tendon position and the motor voltage applied to the actuator:
//! - a PID position controller with setpoint, integral and output clamping
//! - a single-slot, latest-value-wins setpoint handoff for asynchronous writers
//! - sample clocks for fixed-rate execution
//!
//! # Design Principles
//!
//! - **Config/State split**: controller gains and limits are immutable, the
//!   integrator memory lives in a separate state value owned by the caller
//! - **No locks**: cross-thread setpoints use a single atomic word

pub mod command;
pub mod controller;
pub mod error;
pub mod sampled;

pub use command::{SetpointHandle, SetpointSlot};
pub use controller::{PidController, PidGains, PidState};
pub use error::{ControlError, ControlResult};
pub use sampled::{SampleClock, SampleConfig};
