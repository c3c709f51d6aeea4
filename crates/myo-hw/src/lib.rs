//! Hardware abstraction and the fixed-rate joint control loop.
//!
//! The loop owns a [`RobotHardware`] device, a [`ControllerManager`] and a
//! [`Clock`]. Each cycle reads joint state, lets the manager compute commands
//! and writes them back, then sleeps until the next deadline.

pub mod clock;
pub mod control_loop;
pub mod error;
pub mod hardware;
pub mod manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use control_loop::{CycleOutcome, JointControlLoop, LoopConfig, LoopState, LoopStats};
pub use error::{HardwareError, HardwareResult};
pub use hardware::{JointState, JointTable, RobotHardware};
pub use manager::{ControllerManager, PassthroughController};
