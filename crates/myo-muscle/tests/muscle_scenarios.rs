//! End-to-end behaviour of a muscle unit driven tick by tick.

use myo_actuator::{ActuatorError, SeriesElastic, Spindle, electric_motor_force};
use myo_controls::{PidController, PidGains};
use myo_muscle::{
    GeometryError, LinkPoses, MuscleDescriptor, MuscleError, MuscleUnit, build_topology,
    load_json, load_yaml,
};
use nalgebra::{Isometry3, Vector3};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

fn single_joint(points: Vec<[f64; 3]>) -> MuscleDescriptor {
    let mut via_points = BTreeMap::new();
    via_points.insert("joint0".to_string(), points);
    MuscleDescriptor {
        name: "flexor".to_string(),
        joints: vec!["joint0".to_string()],
        via_points,
        motor: Default::default(),
        gear: Default::default(),
        spindle: Default::default(),
        see: Default::default(),
        pid: Default::default(),
    }
}

fn vertical() -> Vec<Vector3<f64>> {
    vec![Vector3::zeros(), Vector3::new(0.0, 0.0, 1.0)]
}

fn sample_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../muscles")
        .join(name)
}

#[test]
fn settles_without_growing_oscillation() {
    let mut unit =
        MuscleUnit::init(Arc::new(single_joint(vec![[0.0; 3], [0.0, 0.0, 1.0]]))).unwrap();
    unit.set_command(0.0);

    let mut previous = f64::INFINITY;
    for tick in 1..=10 {
        let forces = unit.update(tick as f64 * 0.1, 0.1, &vertical()).unwrap();
        assert_eq!(forces.len(), 1);
        let magnitude = forces[0].norm();
        assert!(
            magnitude <= previous + 1e-12,
            "tick {tick}: |F| grew from {previous} to {magnitude}"
        );
        previous = magnitude;
    }
}

#[test]
fn pre_stretched_spring_relaxes_monotonically() {
    let descriptor = MuscleDescriptor {
        see: SeriesElastic {
            length: 0.060,
            rest_length: 0.056,
            ..SeriesElastic::default()
        },
        ..single_joint(vec![[0.0; 3], [0.0, 0.0, 1.0]])
    };
    let mut unit = MuscleUnit::init(Arc::new(descriptor)).unwrap();
    unit.set_command(0.0);

    let first = unit.update(0.1, 0.1, &vertical()).unwrap()[0].norm();
    assert!(first > 1.0, "stretched spring should pull, got {first} N");

    let mut previous = first;
    for tick in 2..=10 {
        let magnitude = unit.update(tick as f64 * 0.1, 0.1, &vertical()).unwrap()[0].norm();
        assert!(magnitude.is_finite());
        assert!(
            magnitude <= previous + 1e-9,
            "tick {tick}: |F| grew from {previous} to {magnitude}"
        );
        previous = magnitude;
    }
    assert!(previous < first, "force never relaxed from {first} N");
}

#[test]
fn zero_spindle_radius_is_configuration_error() {
    let descriptor = MuscleDescriptor {
        spindle: Spindle {
            radius: 0.0,
            ..Spindle::default()
        },
        ..single_joint(vec![[0.0; 3], [0.0, 0.0, 1.0]])
    };
    let err = MuscleUnit::init(Arc::new(descriptor)).unwrap_err();
    assert!(err.is_configuration(), "{err}");

    assert!(matches!(
        electric_motor_force(1.0, 0.0335, 0.0),
        Err(ActuatorError::Configuration { .. })
    ));
}

#[test]
fn single_via_point_is_insufficient() {
    assert_eq!(
        build_topology(&[Vector3::new(0.0, 0.0, 1.0)]),
        Err(GeometryError::InsufficientPoints { got: 1 })
    );

    let mut unit =
        MuscleUnit::init(Arc::new(single_joint(vec![[0.0; 3], [0.0, 0.0, 1.0]]))).unwrap();
    let err = unit
        .update(0.1, 0.1, &[Vector3::new(0.0, 0.0, 1.0)])
        .unwrap_err();
    assert!(matches!(
        err,
        MuscleError::Geometry(GeometryError::InsufficientPoints { got: 1 })
    ));
    assert!(err.is_recoverable());
    assert!(!unit.is_faulted());
}

#[test]
fn tracks_spooled_length_setpoint() {
    let descriptor = MuscleDescriptor {
        see: SeriesElastic {
            stiffness: 0.0,
            ..SeriesElastic::default()
        },
        pid: PidController::new(
            PidGains {
                kp: 500.0,
                ki: 0.0,
                kd: 0.0,
            },
            -24.0,
            24.0,
            100.0,
            100.0,
        )
        .unwrap(),
        ..single_joint(vec![[0.0; 3], [0.0, 0.0, 1.0]])
    };
    let mut unit = MuscleUnit::init(Arc::new(descriptor)).unwrap();
    let setpoint = 0.005;
    unit.command_handle().store(setpoint);

    for tick in 1..=600 {
        unit.update(tick as f64 * 0.01, 0.01, &vertical()).unwrap();
    }

    let state = unit.state();
    assert!(
        (state.spooled_length - setpoint).abs() < 5e-4,
        "spooled = {}",
        state.spooled_length
    );
    assert_eq!(state.setpoint, setpoint);
    assert_eq!(state.elastic_force, 0.0);
}

#[test]
fn latest_command_wins() {
    let mut unit =
        MuscleUnit::init(Arc::new(single_joint(vec![[0.0; 3], [0.0, 0.0, 1.0]]))).unwrap();
    let handle = unit.command_handle();
    handle.store(0.01);
    handle.store(0.02);
    assert!(!handle.store(f64::NAN));
    unit.update(0.01, 0.01, &vertical()).unwrap();
    assert_eq!(unit.state().setpoint, 0.02);
}

#[test]
fn stretched_tendon_is_pulled_back() {
    let mut unit =
        MuscleUnit::init(Arc::new(single_joint(vec![[0.0; 3], [0.0, 0.0, 1.0]]))).unwrap();
    unit.update(0.001, 0.001, &vertical()).unwrap();

    // Insertion pulled 2 mm away from the actuator.
    let stretched = vec![Vector3::new(0.0, 0.0, -0.002), Vector3::new(0.0, 0.0, 1.0)];
    let forces = unit.update(0.002, 0.001, &stretched).unwrap();
    // The insertion is pulled toward the next via-point.
    assert!(forces[0].z > 0.0);
    assert!(unit.state().elastic_force > 0.0);
}

#[test]
fn moving_links_carry_via_points() {
    let mut via_points = BTreeMap::new();
    via_points.insert("forearm".to_string(), vec![[0.0, 0.0, 0.1]]);
    via_points.insert("upper_arm".to_string(), vec![[0.0, 0.0, 0.0]]);
    let descriptor = MuscleDescriptor {
        joints: vec!["forearm".to_string(), "upper_arm".to_string()],
        via_points,
        ..single_joint(vec![])
    };
    let mut unit = MuscleUnit::init(Arc::new(descriptor)).unwrap();

    let mut poses = LinkPoses::new();
    poses.insert("upper_arm".to_string(), Isometry3::identity());
    poses.insert(
        "forearm".to_string(),
        Isometry3::translation(0.0, 0.0, -0.5),
    );
    unit.update_from_poses(0.01, 0.01, poses.clone()).unwrap();
    assert!((unit.state().tendon_length - 0.4).abs() < 1e-12);

    // Forearm rotates a quarter turn about x: its via-point swings onto -y.
    poses.insert(
        "forearm".to_string(),
        Isometry3::new(
            Vector3::new(0.0, 0.0, -0.5),
            Vector3::x() * std::f64::consts::FRAC_PI_2,
        ),
    );
    unit.update_from_poses(0.02, 0.01, poses).unwrap();
    let points = unit.global_via_points().unwrap();
    assert!((points[0] - Vector3::new(0.0, -0.1, -0.5)).norm() < 1e-12);
    let expected = (0.25_f64 + 0.01).sqrt();
    assert!((unit.state().tendon_length - expected).abs() < 1e-12);
    assert!(unit.state().tendon_velocity > 0.0);
}

#[test]
fn sample_descriptor_loads() {
    let descriptor = load_yaml(&sample_path("biceps.yaml")).unwrap();
    assert_eq!(descriptor.name, "biceps");
    assert_eq!(descriptor.via_point_count(), 3);
    assert_eq!(descriptor.segment_count(), 2);
    assert_eq!(descriptor.gear.ratio, 53.0);

    let unit = MuscleUnit::init(Arc::new(descriptor)).unwrap();
    assert_eq!(unit.forces().len(), 2);
}

#[test]
fn json_descriptor_round_trips_through_disk() {
    let descriptor = single_joint(vec![[0.0; 3], [0.0, 0.0, 1.0]]);
    let dir = std::env::temp_dir().join(format!("myo-muscle-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("flexor.json");
    std::fs::write(&path, serde_json::to_string_pretty(&descriptor).unwrap()).unwrap();

    let loaded = load_json(&path).unwrap();
    assert_eq!(loaded, descriptor);
    std::fs::remove_dir_all(&dir).ok();
}
