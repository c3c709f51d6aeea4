//! Live muscle unit: controller, drive train and tendon bound together.
//!
//! Each simulation step the engine hands the unit the current via-points (or
//! the link poses they are attached to). The unit then:
//!
//! 1. measures the tendon path length and its rate of change
//! 2. runs the PID controller on the spooled tendon length
//! 3. evaluates the series elastic element
//! 4. integrates the motor/gear/spindle drive train
//! 5. projects elastic + motor force onto every tendon segment
//!
//! A failed step never leaves partial state behind: recoverable errors keep
//! the previous forces, and repeated numerical instability faults the unit.

use crate::descriptor::MuscleDescriptor;
use crate::error::{FaultReason, MuscleError, MuscleResult};
use crate::geometry::{TendonTopology, build_topology, project_force};
use crate::visual::{NoopVisualSink, TendonSegmentVisual, VisualSink};
use myo_actuator::{
    ActuatorDynamics, ActuatorError, elastic_element_force, electric_motor_force,
};
use myo_controls::{ControlError, PidState, SetpointHandle, SetpointSlot};
use myo_core::Throttle;
use nalgebra::{Isometry3, Point3, Vector3};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// World-frame poses of the links a tendon is attached to, keyed by joint.
pub type LinkPoses = BTreeMap<String, Isometry3<f64>>;

/// Consecutive unstable ticks before a unit is faulted.
pub const DEFAULT_MAX_INSTABILITY_STREAK: u32 = 10;

/// Minimum spacing of repeated diagnostics, in simulation seconds.
const DIAGNOSTIC_INTERVAL_S: f64 = 1.0;

/// Telemetry snapshot of a muscle unit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MuscleState {
    /// Simulation time of the last successful update (s).
    pub time: f64,
    /// Tendon path length through all via-points (m).
    pub tendon_length: f64,
    /// Rate of change of the path length (m/s).
    pub tendon_velocity: f64,
    /// Tendon wound onto the spindle (m).
    pub spooled_length: f64,
    /// Motor current (A).
    pub current: f64,
    /// Spindle angular velocity (rad/s).
    pub spindle_velocity: f64,
    /// Voltage applied by the controller (V).
    pub voltage: f64,
    /// Series elastic force (N).
    pub elastic_force: f64,
    /// Motor force at the spindle (N).
    pub motor_force: f64,
    /// Latest setpoint (m of spooled tendon).
    pub setpoint: f64,
}

pub struct MuscleUnit {
    descriptor: Arc<MuscleDescriptor>,
    actuator: ActuatorDynamics,
    pid_state: PidState,
    command: SetpointSlot,
    topology: TendonTopology,
    link_poses: LinkPoses,
    forces: Vec<Vector3<f64>>,
    state: MuscleState,
    reference_length: Option<f64>,
    last_update: Option<f64>,
    instability_streak: u32,
    max_instability_streak: u32,
    fault: Option<FaultReason>,
    diagnostics: Throttle,
    visual: Box<dyn VisualSink>,
}

impl std::fmt::Debug for MuscleUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MuscleUnit")
            .field("name", &self.descriptor.name)
            .field("state", &self.state)
            .field("fault", &self.fault)
            .finish_non_exhaustive()
    }
}

impl MuscleUnit {
    /// Bind a descriptor to a fresh actuator at rest.
    ///
    /// # Errors
    /// `Configuration` for malformed descriptors, `Geometry` if the local
    /// via-points do not describe a tendon path.
    pub fn init(descriptor: Arc<MuscleDescriptor>) -> MuscleResult<Self> {
        descriptor.validate()?;
        let actuator = ActuatorDynamics::new(
            descriptor.motor.clone(),
            descriptor.gear.clone(),
            descriptor.spindle.clone(),
        )?;
        let topology = build_topology(&descriptor.local_via_points())?;
        let forces = vec![Vector3::zeros(); topology.segment_count()];

        debug!(
            muscle = %descriptor.name,
            joints = descriptor.joints.len(),
            segments = topology.segment_count(),
            max_substep = actuator.max_substep(),
            "muscle unit initialized"
        );

        Ok(Self {
            descriptor,
            actuator,
            pid_state: PidState::default(),
            command: SetpointSlot::default(),
            topology,
            link_poses: LinkPoses::new(),
            forces,
            state: MuscleState::default(),
            reference_length: None,
            last_update: None,
            instability_streak: 0,
            max_instability_streak: DEFAULT_MAX_INSTABILITY_STREAK,
            fault: None,
            diagnostics: Throttle::new(DIAGNOSTIC_INTERVAL_S),
            visual: Box::new(NoopVisualSink),
        })
    }

    /// Attach a visualization sink.
    pub fn with_visual_sink(mut self, sink: Box<dyn VisualSink>) -> Self {
        self.visual = sink;
        self
    }

    /// Consecutive unstable ticks tolerated before faulting (at least 1).
    pub fn with_max_instability_streak(mut self, streak: u32) -> Self {
        self.max_instability_streak = streak.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn descriptor(&self) -> &Arc<MuscleDescriptor> {
        &self.descriptor
    }

    /// Writer handle for the position setpoint.
    pub fn command_handle(&self) -> SetpointHandle {
        self.command.handle()
    }

    /// Store a new setpoint (spooled tendon length, m).
    pub fn set_command(&self, setpoint: f64) -> bool {
        self.command.handle().store(setpoint)
    }

    /// Forces from the last successful update, one per segment.
    pub fn forces(&self) -> &[Vector3<f64>] {
        &self.forces
    }

    pub fn state(&self) -> MuscleState {
        self.state
    }

    pub fn topology(&self) -> &TendonTopology {
        &self.topology
    }

    pub fn pid_state(&self) -> &PidState {
        &self.pid_state
    }

    pub fn actuator(&self) -> &ActuatorDynamics {
        &self.actuator
    }

    pub fn last_update(&self) -> Option<f64> {
        self.last_update
    }

    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    /// Why the unit stopped, if it has.
    pub fn fault(&self) -> Option<FaultReason> {
        self.fault
    }

    /// Replace the cached link poses.
    pub fn set_link_poses(&mut self, poses: LinkPoses) {
        self.link_poses = poses;
    }

    pub fn link_poses(&self) -> &LinkPoses {
        &self.link_poses
    }

    /// Descriptor via-points transformed into the world frame by the cached
    /// link poses, in joint order.
    pub fn global_via_points(&self) -> MuscleResult<Vec<Vector3<f64>>> {
        let mut points = Vec::with_capacity(self.descriptor.via_point_count());
        for joint in &self.descriptor.joints {
            let pose = self
                .link_poses
                .get(joint)
                .ok_or_else(|| MuscleError::MissingLinkPose {
                    link: joint.clone(),
                })?;
            if let Some(local) = self.descriptor.via_points.get(joint) {
                points.extend(
                    local
                        .iter()
                        .map(|p| pose.transform_point(&Point3::from(*p)).coords),
                );
            }
        }
        Ok(points)
    }

    /// Cache `poses` and update from the via-points they place in the world.
    pub fn update_from_poses(
        &mut self,
        time: f64,
        period: f64,
        poses: LinkPoses,
    ) -> MuscleResult<&[Vector3<f64>]> {
        self.set_link_poses(poses);
        let points = self.global_via_points()?;
        self.update(time, period, &points)
    }

    /// Advance the unit by `period` seconds.
    ///
    /// `via_points` are the tendon's via-points in the world frame, in
    /// descriptor order. Returns one force per segment.
    ///
    /// # Errors
    /// - `Faulted` once the unit has given up; no further updates run.
    /// - `Control(InvalidTimestep)` for a non-positive period (faults the unit).
    /// - `Geometry`, `ViaPointMismatch` and `Actuator(NumericalInstability)`
    ///   are recoverable: the previous forces and state are kept.
    pub fn update(
        &mut self,
        time: f64,
        period: f64,
        via_points: &[Vector3<f64>],
    ) -> MuscleResult<&[Vector3<f64>]> {
        if let Some(reason) = self.fault {
            return Err(self.faulted_error(reason));
        }
        if !(period > 0.0 && period.is_finite()) {
            self.fault = Some(FaultReason::InvalidTimestep { dt: period });
            error!(muscle = %self.descriptor.name, period, "non-positive update period");
            return Err(ControlError::InvalidTimestep { dt: period }.into());
        }

        let topology = build_topology(via_points)?;
        let expected = self.descriptor.via_point_count();
        if via_points.len() != expected {
            return Err(MuscleError::ViaPointMismatch {
                expected,
                got: via_points.len(),
            });
        }

        let length = topology.length();
        let reference = self.reference_length.unwrap_or(length);
        let velocity = match self.last_update {
            Some(_) => (length - self.state.tendon_length) / period,
            None => 0.0,
        };

        let setpoint = self.command.load();
        let spooled = self.actuator.spooled_length();
        let (pid_state, voltage) =
            self.descriptor
                .pid
                .calc_output(&self.pid_state, setpoint, spooled, period)?;

        let see = &self.descriptor.see;
        let radius = self.actuator.spindle.radius;
        let see_length = see.length + (length - reference) + spooled;
        let elastic = elastic_element_force(
            see.rest_length,
            see_length,
            see.stiffness,
            self.actuator.state().spindle_velocity(),
            radius,
            period,
        )?;

        match self.actuator.step(voltage, elastic, period) {
            Ok(_) => self.instability_streak = 0,
            Err(e @ ActuatorError::NumericalInstability { .. }) => {
                return Err(self.on_instability(time, e));
            }
            Err(e) => {
                self.fault = Some(FaultReason::ActuatorFailure);
                error!(muscle = %self.descriptor.name, error = %e, "actuator step failed");
                return Err(e.into());
            }
        }

        let current = self.actuator.state().current();
        let motor = electric_motor_force(current, self.actuator.motor.torque_const, radius)?;

        let forces = topology
            .vectors
            .iter()
            .map(|v| project_force(elastic, motor, v))
            .collect::<Result<Vec<_>, _>>()?;

        self.pid_state = pid_state;
        self.reference_length = Some(reference);
        self.last_update = Some(time);
        self.state = MuscleState {
            time,
            tendon_length: length,
            tendon_velocity: velocity,
            spooled_length: self.actuator.spooled_length(),
            current,
            spindle_velocity: self.actuator.state().spindle_velocity(),
            voltage,
            elastic_force: elastic,
            motor_force: motor,
            setpoint,
        };
        self.topology = topology;
        self.forces = forces;
        self.publish_visuals();

        Ok(&self.forces)
    }

    fn on_instability(&mut self, time: f64, e: ActuatorError) -> MuscleError {
        self.instability_streak += 1;
        if self.instability_streak >= self.max_instability_streak {
            let reason = FaultReason::Instability {
                streak: self.instability_streak,
            };
            self.fault = Some(reason);
            error!(
                muscle = %self.descriptor.name,
                streak = self.instability_streak,
                "actuator diverged repeatedly, unit faulted"
            );
            return self.faulted_error(reason);
        }
        if self.diagnostics.admit(time) {
            warn!(
                muscle = %self.descriptor.name,
                streak = self.instability_streak,
                error = %e,
                "actuator integration diverged, holding previous state"
            );
        }
        e.into()
    }

    fn faulted_error(&self, reason: FaultReason) -> MuscleError {
        MuscleError::Faulted {
            name: self.descriptor.name.clone(),
            reason,
        }
    }

    fn publish_visuals(&mut self) {
        let t = &self.topology;
        for i in 0..t.segment_count() {
            let segment = TendonSegmentVisual {
                muscle: self.descriptor.name.clone(),
                index: i,
                mid_point: t.mid_points[i],
                orientation: t.orientations[i],
                length: t.vectors[i].norm(),
                pitch: t.pitch[i],
                roll: t.roll[i],
                force: self.forces[i],
            };
            self.visual.publish(&segment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use myo_actuator::{Gear, Motor, SeriesElastic, Spindle};
    use myo_controls::{PidController, PidGains};
    use std::sync::Mutex;

    fn descriptor(points: Vec<[f64; 3]>) -> MuscleDescriptor {
        let mut via_points = BTreeMap::new();
        via_points.insert("joint0".to_string(), points);
        MuscleDescriptor {
            name: "test".to_string(),
            joints: vec!["joint0".to_string()],
            via_points,
            motor: Motor::default(),
            gear: Gear::default(),
            spindle: Spindle::default(),
            see: SeriesElastic {
                stiffness: 1000.0,
                length: 0.05,
                rest_length: 0.05,
            },
            pid: PidController::default(),
        }
    }

    fn straight() -> Vec<Vector3<f64>> {
        vec![Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0)]
    }

    #[test]
    fn init_zeroes_state() {
        let unit = MuscleUnit::init(Arc::new(descriptor(vec![[0.0; 3], [0.0, 0.0, 1.0]]))).unwrap();
        assert_eq!(unit.forces(), &[Vector3::<f64>::zeros()]);
        assert_eq!(unit.pid_state(), &PidState::default());
        assert_eq!(unit.state(), MuscleState::default());
        assert!(unit.last_update().is_none());
    }

    #[test]
    fn init_rejects_malformed_descriptor() {
        let mut d = descriptor(vec![[0.0; 3], [0.0, 0.0, 1.0]]);
        d.joints.push("ghost".to_string());
        let err = MuscleUnit::init(Arc::new(d)).unwrap_err();
        assert!(err.is_configuration());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn at_rest_produces_no_force() {
        let mut unit =
            MuscleUnit::init(Arc::new(descriptor(vec![[0.0; 3], [0.0, 0.0, 1.0]]))).unwrap();
        let forces = unit.update(0.01, 0.01, &straight()).unwrap();
        assert_eq!(forces.len(), 1);
        assert_eq!(forces[0], Vector3::zeros());
    }

    #[test]
    fn stretched_tendon_pulls_along_segments() {
        let mut unit = MuscleUnit::init(Arc::new(descriptor(vec![
            [0.0; 3],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
        ])))
        .unwrap();
        let rest = vec![
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 1.0),
        ];
        unit.update(0.001, 0.001, &rest).unwrap();

        // Insertion moves 1 cm away: the SEE stretches by 1 cm.
        let stretched = vec![
            Vector3::new(0.0, 0.0, -0.01),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 1.0),
        ];
        let forces = unit.update(0.002, 0.001, &stretched).unwrap().to_vec();
        let state = unit.state();
        assert!(state.elastic_force > 9.0, "elastic = {}", state.elastic_force);
        assert!(state.tendon_velocity > 0.0);
        assert_eq!(forces.len(), 2);
        // Both segments carry the same tension along their own direction.
        assert!(forces[0].z > 0.0 && forces[0].x.abs() < 1e-12);
        assert!(forces[1].x > 0.0 && forces[1].z.abs() < 1e-12);
        assert!((forces[0].norm() - forces[1].norm()).abs() < 1e-9);
    }

    #[test]
    fn geometry_failure_holds_previous_forces() {
        let mut unit = MuscleUnit::init(Arc::new(descriptor(vec![[0.0; 3], [0.0, 0.0, 1.0]])))
            .unwrap();
        unit.update(0.01, 0.01, &straight()).unwrap();
        let before = unit.forces().to_vec();
        let state = unit.state();

        let err = unit.update(0.02, 0.01, &[Vector3::zeros()]).unwrap_err();
        assert!(err.is_recoverable());
        let err = unit
            .update(0.02, 0.01, &[Vector3::zeros(), Vector3::zeros()])
            .unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(unit.forces(), before.as_slice());
        assert_eq!(unit.state(), state);
    }

    #[test]
    fn via_point_count_must_match() {
        let mut unit = MuscleUnit::init(Arc::new(descriptor(vec![[0.0; 3], [0.0, 0.0, 1.0]])))
            .unwrap();
        let three = vec![
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 0.0, 2.0),
        ];
        assert!(matches!(
            unit.update(0.01, 0.01, &three),
            Err(MuscleError::ViaPointMismatch {
                expected: 2,
                got: 3
            })
        ));
    }

    #[test]
    fn non_positive_period_faults_unit() {
        let mut unit = MuscleUnit::init(Arc::new(descriptor(vec![[0.0; 3], [0.0, 0.0, 1.0]])))
            .unwrap();
        let err = unit.update(0.0, 0.0, &straight()).unwrap_err();
        assert!(matches!(
            err,
            MuscleError::Control(ControlError::InvalidTimestep { .. })
        ));
        assert_eq!(
            unit.fault(),
            Some(FaultReason::InvalidTimestep { dt: 0.0 })
        );
        // Later updates keep reporting the period, not an instability streak.
        let later = unit.update(0.1, 0.1, &straight()).unwrap_err();
        assert!(matches!(
            later,
            MuscleError::Faulted {
                reason: FaultReason::InvalidTimestep { .. },
                ..
            }
        ));
        assert!(later.to_string().contains("non-positive update period"));
    }

    #[test]
    fn repeated_instability_escalates() {
        let mut d = descriptor(vec![[0.0; 3], [0.0, 0.0, 1.0]]);
        // A 10 m stretch on this spring overflows the elastic force.
        d.see = SeriesElastic {
            stiffness: 1e308,
            length: 10.0,
            rest_length: 0.0,
        };
        let mut unit = MuscleUnit::init(Arc::new(d))
            .unwrap()
            .with_max_instability_streak(3);

        for tick in 1..3 {
            let err = unit.update(tick as f64 * 0.01, 0.01, &straight()).unwrap_err();
            assert!(err.is_recoverable(), "tick {tick}: {err}");
            assert_eq!(unit.actuator().state().x, nalgebra::Vector2::zeros());
        }
        let err = unit.update(0.03, 0.01, &straight()).unwrap_err();
        assert!(matches!(
            err,
            MuscleError::Faulted {
                reason: FaultReason::Instability { streak: 3 },
                ..
            }
        ));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn poses_place_via_points_in_world() {
        let mut via_points = BTreeMap::new();
        via_points.insert("upper".to_string(), vec![[0.0, 0.0, 0.0]]);
        via_points.insert("lower".to_string(), vec![[0.0, 0.0, 0.5]]);
        let d = MuscleDescriptor {
            joints: vec!["lower".to_string(), "upper".to_string()],
            via_points,
            ..descriptor(vec![])
        };
        let mut unit = MuscleUnit::init(Arc::new(d)).unwrap();

        let mut poses = LinkPoses::new();
        poses.insert(
            "upper".to_string(),
            Isometry3::translation(0.0, 0.0, 1.0),
        );
        assert!(matches!(
            unit.update_from_poses(0.01, 0.01, poses.clone()),
            Err(MuscleError::MissingLinkPose { .. })
        ));

        poses.insert(
            "lower".to_string(),
            Isometry3::translation(0.0, 0.0, -1.0),
        );
        unit.set_link_poses(poses.clone());
        let points = unit.global_via_points().unwrap();
        assert_eq!(points[0], Vector3::new(0.0, 0.0, -0.5));
        assert_eq!(points[1], Vector3::new(0.0, 0.0, 1.0));

        let forces = unit.update_from_poses(0.01, 0.01, poses).unwrap();
        assert_eq!(forces.len(), 1);
        assert!((unit.state().tendon_length - 1.5).abs() < 1e-12);
    }

    #[test]
    fn command_handle_feeds_controller() {
        let d = MuscleDescriptor {
            pid: PidController::new(
                PidGains {
                    kp: 100.0,
                    ki: 0.0,
                    kd: 0.0,
                },
                -24.0,
                24.0,
                1.0,
                1.0,
            )
            .unwrap(),
            ..descriptor(vec![[0.0; 3], [0.0, 0.0, 1.0]])
        };
        let mut unit = MuscleUnit::init(Arc::new(d)).unwrap();
        let handle = unit.command_handle();
        handle.store(0.01);
        unit.update(0.001, 0.001, &straight()).unwrap();
        let state = unit.state();
        assert_eq!(state.setpoint, 0.01);
        assert!((state.voltage - 1.0).abs() < 1e-12);
        assert!(state.current > 0.0);
    }

    struct Recorder(Arc<Mutex<Vec<TendonSegmentVisual>>>);

    impl VisualSink for Recorder {
        fn publish(&mut self, segment: &TendonSegmentVisual) {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(segment.clone());
            }
        }
    }

    #[test]
    fn visual_sink_sees_every_segment() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut unit = MuscleUnit::init(Arc::new(descriptor(vec![
            [0.0; 3],
            [0.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
        ])))
        .unwrap()
        .with_visual_sink(Box::new(Recorder(Arc::clone(&seen))));
        let points = vec![
            Vector3::zeros(),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(0.0, 1.0, 1.0),
        ];
        unit.update(0.01, 0.01, &points).unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1].index, 1);
        assert_eq!(seen[0].mid_point, Vector3::new(0.0, 0.0, 0.5));
    }
}
