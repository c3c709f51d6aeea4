use myo_muscle::{build_topology, project_force};
use nalgebra::Vector3;
use proptest::prelude::*;

fn direction() -> impl Strategy<Value = Vector3<f64>> {
    (-10.0_f64..10.0, -10.0_f64..10.0, -10.0_f64..10.0)
        .prop_map(|(x, y, z)| Vector3::new(x, y, z))
        .prop_filter("non-degenerate", |v| v.norm() > 1e-3)
}

proptest! {
    #[test]
    fn projected_force_has_summed_magnitude(
        elastic in 0.0_f64..1e4,
        motor in -1e3_f64..1e3,
        dir in direction(),
    ) {
        let f = project_force(elastic, motor, &dir).unwrap();
        let total = elastic + motor;
        prop_assert!((f.norm() - total.abs()).abs() <= 1e-9 * (1.0 + total.abs()));
    }

    #[test]
    fn projected_force_is_parallel_to_tendon(
        elastic in 0.0_f64..1e4,
        motor in -1e3_f64..1e3,
        dir in direction(),
    ) {
        let f = project_force(elastic, motor, &dir).unwrap();
        let unit = dir.normalize();
        prop_assert!(f.cross(&unit).norm() <= 1e-9 * (1.0 + f.norm()));
        prop_assert!(f.dot(&unit) * (elastic + motor) >= 0.0);
    }

    #[test]
    fn topology_length_is_sum_of_segments(
        points in prop::collection::vec(direction(), 2..8),
    ) {
        prop_assume!(points.windows(2).all(|w| (w[1] - w[0]).norm() > 1e-6));
        let topology = build_topology(&points).unwrap();
        prop_assert_eq!(topology.segment_count(), points.len() - 1);
        let expected: f64 = points.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
        prop_assert!((topology.length() - expected).abs() <= 1e-9 * (1.0 + expected));
        for o in &topology.orientations {
            prop_assert!((o.norm() - 1.0).abs() < 1e-12);
        }
    }
}
