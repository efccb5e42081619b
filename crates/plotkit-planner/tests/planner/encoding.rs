use plotkit_core::{Point, StepperConfig};
use plotkit_planner::CommandEncoder;
use proptest::prelude::*;

fn stepper() -> impl Strategy<Value = StepperConfig> {
    (any::<bool>(), any::<bool>(), any::<bool>(), 1u8..=5).prop_map(
        |(invert_x, invert_y, corexy, step_mode)| StepperConfig {
            invert_x,
            invert_y,
            corexy,
            step_mode,
            ..StepperConfig::default()
        },
    )
}

proptest! {
    #[test]
    fn prop_steps_decode_within_one_step(
        cfg in stepper(),
        x0 in -200.0f64..200.0, y0 in -200.0f64..200.0,
        x1 in -200.0f64..200.0, y1 in -200.0f64..200.0,
    ) {
        let enc = CommandEncoder::new(&cfg);
        let (from, to) = (Point::new(x0, y0), Point::new(x1, y1));
        let decoded = enc.decode_steps(enc.axis_steps(&from, &to));
        let resolution = 1.0 / enc.steps_per_mm();
        let expected = to - from;
        prop_assert!((decoded.x - expected.x).abs() <= resolution + 1e-9);
        prop_assert!((decoded.y - expected.y).abs() <= resolution + 1e-9);
    }

    #[test]
    fn prop_consecutive_moves_do_not_drift(
        raw in prop::collection::vec((-100.0f64..100.0, -100.0f64..100.0), 2..50),
    ) {
        let enc = CommandEncoder::new(&StepperConfig::default());
        let points: Vec<Point> = raw.into_iter().map(Point::from).collect();
        let (mut a, mut b) = (0i64, 0i64);
        for pair in points.windows(2) {
            let (da, db) = enc.axis_steps(&pair[0], &pair[1]);
            a += da;
            b += db;
        }
        let direct = enc.axis_steps(&points[0], &points[points.len() - 1]);
        prop_assert_eq!((a, b), direct);
    }
}

#[test]
fn test_lm_wire_fields() {
    let enc = CommandEncoder::new(&StepperConfig::default());
    let cmd = enc
        .accelerated_move(&Point::new(0.0, 0.0), &Point::new(10.0, 0.0), 10.0, 20.0)
        .unwrap();
    let fields: Vec<&str> = cmd.wire.split(',').collect();
    assert_eq!(fields.len(), 8);
    assert_eq!(fields[0], "LM");
    assert_eq!(fields[2], "800");
    assert_eq!(fields[5], "800");
    assert_eq!(fields[7], "3");
    assert!(fields[3].parse::<i64>().unwrap() > 0);
    // 10 mm at an average of 15 mm/s
    assert_eq!(cmd.duration_ms, 667);
}
