//! Tendon-driven muscle units.
//!
//! A [`MuscleUnit`] binds one [`MuscleDescriptor`] to a live actuator: every
//! simulation step it takes the via-points of the tendon in the world frame,
//! runs the position controller, integrates the drive train and returns one
//! force vector per tendon segment.

pub mod descriptor;
pub mod error;
pub mod geometry;
pub mod unit;
pub mod visual;

pub use descriptor::{DescriptorError, MuscleDescriptor, load_json, load_yaml};
pub use error::{FaultReason, MuscleError, MuscleResult};
pub use geometry::{
    GeometryError, GeometryResult, TendonTopology, angle_between, build_topology, project_force,
};
pub use unit::{LinkPoses, MuscleState, MuscleUnit};
pub use visual::{NoopVisualSink, TendonSegmentVisual, VisualSink};
