//! Joint state table and the device interface.

use crate::error::{HardwareError, HardwareResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// State and command of a single joint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JointState {
    pub position: f64,
    pub velocity: f64,
    pub effort: f64,
    /// Command written back to the device.
    pub command: f64,
}

/// Joint states keyed by joint name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JointTable {
    joints: BTreeMap<String, JointState>,
}

impl JointTable {
    /// Table with one zeroed entry per name.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            joints: names
                .into_iter()
                .map(|n| (n.into(), JointState::default()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.joints.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&JointState> {
        self.joints.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut JointState> {
        self.joints.get_mut(name)
    }

    /// Mutable access that reports unknown names as errors.
    pub fn joint_mut(&mut self, name: &str) -> HardwareResult<&mut JointState> {
        self.joints
            .get_mut(name)
            .ok_or_else(|| HardwareError::UnknownJoint {
                name: name.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.joints.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JointState)> {
        self.joints.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut JointState)> {
        self.joints.iter_mut().map(|(k, v)| (k.as_str(), v))
    }
}

/// A device (or simulated model) exchanging joint state with the loop.
///
/// `read` fills the joint table from the device, `write` pushes the commands
/// in it back. Neither is called while `is_ready` is `false`.
pub trait RobotHardware {
    fn is_ready(&self) -> bool;

    fn read(&mut self, time: f64, period: f64) -> HardwareResult<()>;

    fn write(&mut self, time: f64, period: f64) -> HardwareResult<()>;

    fn joints(&self) -> &JointTable;

    fn joints_mut(&mut self) -> &mut JointTable;
}
