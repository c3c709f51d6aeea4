//! Simulated test rig: one muscle unit behind the hardware interface.
//!
//! The rig exposes a single joint named after the muscle. Reading advances the
//! muscle simulation up to the loop time in fixed sub-steps with the last
//! written command; the joint then reports spooled tendon length as position
//! and series elastic force as effort. Writing stores the joint command as the
//! muscle setpoint. Link poses stay at the identity, so via-points sit where
//! the descriptor puts them.

use myo_hw::{HardwareError, HardwareResult, JointTable, RobotHardware};
use myo_muscle::{LinkPoses, MuscleResult, MuscleUnit};
use nalgebra::Isometry3;
use tracing::debug;

pub struct MuscleRig {
    unit: MuscleUnit,
    joint: String,
    joints: JointTable,
    sim_step: f64,
    sim_time: f64,
    skipped: u64,
}

impl MuscleRig {
    pub fn new(mut unit: MuscleUnit, sim_step: f64) -> HardwareResult<Self> {
        if !(sim_step > 0.0 && sim_step.is_finite()) {
            return Err(HardwareError::InvalidConfig {
                what: "simulation step must be positive",
            });
        }
        let poses: LinkPoses = unit
            .descriptor()
            .joints
            .iter()
            .map(|j| (j.clone(), Isometry3::identity()))
            .collect();
        unit.set_link_poses(poses);
        let joint = unit.name().to_string();
        Ok(Self {
            joints: JointTable::new([joint.clone()]),
            joint,
            unit,
            sim_step,
            sim_time: 0.0,
            skipped: 0,
        })
    }

    pub fn joint_name(&self) -> &str {
        &self.joint
    }

    pub fn unit(&self) -> &MuscleUnit {
        &self.unit
    }

    /// Updates dropped because of recoverable muscle errors.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    fn step_unit(&mut self, h: f64) -> MuscleResult<()> {
        let points = self.unit.global_via_points()?;
        self.unit.update(self.sim_time, h, &points)?;
        Ok(())
    }

    fn advance(&mut self, period: f64) -> HardwareResult<()> {
        if period <= 0.0 {
            return Ok(());
        }
        let steps = (period / self.sim_step).ceil().max(1.0) as usize;
        let h = period / steps as f64;
        for _ in 0..steps {
            self.sim_time += h;
            match self.step_unit(h) {
                Ok(()) => {}
                Err(e) if e.is_recoverable() => {
                    self.skipped += 1;
                    debug!(time = self.sim_time, error = %e, "muscle update skipped");
                }
                Err(e) => {
                    return Err(HardwareError::Device {
                        what: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl RobotHardware for MuscleRig {
    fn is_ready(&self) -> bool {
        !self.unit.is_faulted()
    }

    fn read(&mut self, _time: f64, period: f64) -> HardwareResult<()> {
        self.advance(period)?;
        let state = self.unit.state();
        let radius = self.unit.actuator().spindle.radius;
        let joint = self.joints.joint_mut(&self.joint)?;
        joint.position = state.spooled_length;
        joint.velocity = state.spindle_velocity * radius;
        joint.effort = state.elastic_force;
        Ok(())
    }

    fn write(&mut self, _time: f64, _period: f64) -> HardwareResult<()> {
        let command = self.joints.joint_mut(&self.joint)?.command;
        if !self.unit.set_command(command) {
            return Err(HardwareError::Device {
                what: format!("non-finite command {command} for '{}'", self.joint),
            });
        }
        Ok(())
    }

    fn joints(&self) -> &JointTable {
        &self.joints
    }

    fn joints_mut(&mut self) -> &mut JointTable {
        &mut self.joints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myo_hw::{CycleOutcome, JointControlLoop, LoopConfig, ManualClock, PassthroughController};
    use myo_muscle::MuscleDescriptor;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn flexor() -> MuscleUnit {
        let mut via_points = BTreeMap::new();
        via_points.insert("elbow".to_string(), vec![[0.0, 0.0, -0.1]]);
        via_points.insert("shoulder".to_string(), vec![[0.0, 0.0, 0.2]]);
        let descriptor = MuscleDescriptor {
            name: "flexor".to_string(),
            joints: vec!["elbow".to_string(), "shoulder".to_string()],
            via_points,
            motor: Default::default(),
            gear: Default::default(),
            spindle: Default::default(),
            see: Default::default(),
            pid: Default::default(),
        };
        MuscleUnit::init(Arc::new(descriptor)).unwrap()
    }

    #[test]
    fn rejects_non_positive_step() {
        assert!(MuscleRig::new(flexor(), 0.0).is_err());
    }

    #[test]
    fn loop_drives_the_muscle() {
        let rig = MuscleRig::new(flexor(), 0.001).unwrap();
        let manager = PassthroughController::new([rig.joint_name()]);
        let setpoint = manager.handle("flexor").unwrap();
        let mut lp = JointControlLoop::new(
            rig,
            manager,
            ManualClock::new(0.0),
            LoopConfig::default(),
        )
        .unwrap();

        setpoint.store(0.005);
        for _ in 0..20 {
            assert!(matches!(
                lp.run_cycle().unwrap(),
                CycleOutcome::Completed { .. }
            ));
        }

        let joint = *lp.hardware().joints().get("flexor").unwrap();
        assert_eq!(joint.command, 0.005);
        assert!(joint.position > 0.0, "position = {}", joint.position);
        assert!(joint.position < 0.01);
        // Winding against the fixed insertion loads the spring.
        assert!(joint.effort > 0.0);
        assert_eq!(lp.hardware().skipped(), 0);
        assert!(!lp.hardware().unit().is_faulted());
    }
}
