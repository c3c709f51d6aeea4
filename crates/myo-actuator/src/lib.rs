//! Actuator physics for tendon-driven myo-muscles.
//!
//! Provides:
//! - Electric motor force model (current → tendon force)
//! - Series elastic element force law with spindle winding
//! - Coupled motor/gear/spindle ODE integrated with fixed-step RK4
//! - Automatic sub-stepping below the drive train's stability bound

pub mod dynamics;
pub mod elastic;
pub mod error;
pub mod integrator;
pub mod model;
pub mod motor;
pub mod params;

pub use dynamics::{ActuatorDynamics, ActuatorState, DriveTrain, StepReport, efficiency_approximation};
pub use elastic::elastic_element_force;
pub use error::{ActuatorError, ActuatorResult};
pub use integrator::{Integrator, Rk4};
pub use model::TransientModel;
pub use motor::electric_motor_force;
pub use params::{Gear, Motor, SeriesElastic, Spindle};
