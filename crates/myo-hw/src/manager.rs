//! Controller managers invoked once per loop cycle.

use crate::error::{HardwareError, HardwareResult};
use crate::hardware::JointTable;
use myo_controls::{SetpointHandle, SetpointSlot};
use std::collections::BTreeMap;

/// Computes joint commands from the joint state read this cycle.
pub trait ControllerManager {
    fn update(&mut self, joints: &mut JointTable, time: f64, period: f64) -> HardwareResult<()>;
}

/// Forwards externally written setpoints to the joint commands unchanged.
///
/// Each joint gets its own setpoint slot; writers on other threads hold a
/// [`SetpointHandle`] and the latest stored value is copied into the joint's
/// command every cycle.
#[derive(Debug, Clone, Default)]
pub struct PassthroughController {
    slots: BTreeMap<String, SetpointSlot>,
}

impl PassthroughController {
    pub fn new<I, S>(joints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            slots: joints
                .into_iter()
                .map(|j| (j.into(), SetpointSlot::default()))
                .collect(),
        }
    }

    pub fn handle(&self, joint: &str) -> Option<SetpointHandle> {
        self.slots.get(joint).map(SetpointSlot::handle)
    }
}

impl ControllerManager for PassthroughController {
    fn update(&mut self, joints: &mut JointTable, _time: f64, _period: f64) -> HardwareResult<()> {
        for (name, slot) in &self.slots {
            joints.joint_mut(name)?.command = slot.load();
        }
        Ok(())
    }
}
