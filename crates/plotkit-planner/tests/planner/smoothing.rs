use plotkit_core::{path_length, Point};
use plotkit_planner::{build_segments, plan_speeds, smooth_speeds};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_smoothing_respects_limits_and_only_lowers(
        inner in prop::collection::vec(0.0f64..100.0, 0..30),
        deltas_seed in prop::collection::vec(0.01f64..20.0, 31),
    ) {
        let mut speeds = vec![0.0];
        speeds.extend(inner.iter().copied());
        speeds.push(0.0);
        let deltas = &deltas_seed[..speeds.len() - 1];
        let original = speeds.clone();

        smooth_speeds(&mut speeds, deltas);

        prop_assert_eq!(speeds[0], 0.0);
        prop_assert_eq!(*speeds.last().unwrap(), 0.0);
        for (i, d) in deltas.iter().enumerate() {
            prop_assert!((speeds[i] - speeds[i + 1]).abs() <= d + 1e-9);
        }
        for (after, before) in speeds.iter().zip(&original) {
            prop_assert!(after <= before);
            prop_assert!(*after >= 0.0);
        }
    }

    #[test]
    fn prop_planned_segments_pass_emission_check(
        raw in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 2..40),
    ) {
        let path: Vec<Point> = raw.into_iter().map(Point::from).collect();
        let mut segments = build_segments(&path, 200.0);
        plan_speeds(&mut segments, 200.0, 0.127, 50.0);
        for s in &segments {
            prop_assert!(s.check_speed_delta().is_ok());
            prop_assert!(s.entry_speed <= 50.0 && s.exit_speed <= 50.0);
        }
        let total: f64 = segments.iter().map(|s| s.length).sum();
        prop_assert!((total - path_length(&path)).abs() < 1e-6);
    }
}
