use plotkit_core::{MachineConfig, PlanningConfig, PlanningError, Point, StepperConfig};
use plotkit_planner::{CommandKind, MotionPlanner, MotionSegment, PlannerState};

fn config(planning: PlanningConfig) -> MachineConfig {
    MachineConfig {
        stepper: StepperConfig {
            corexy: false,
            ..StepperConfig::default()
        },
        planning,
        ..MachineConfig::default()
    }
}

#[test]
fn test_short_path_becomes_single_direct_move() {
    let cfg = config(PlanningConfig {
        min_move_mm: 6.0,
        fallback_speed: 5.0,
        return_home: false,
        ..PlanningConfig::default()
    });
    let planner = MotionPlanner::new(&cfg).unwrap();
    let plan = planner
        .plan(&vec![vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]])
        .unwrap();

    let wires: Vec<&str> = plan.commands.iter().map(|c| c.wire.as_str()).collect();
    assert_eq!(wires, vec!["SP,0,200", "SM,2000,800,0", "SP,1,200"]);
    assert_eq!(plan.commands[1].duration_ms, 2000);
    assert_eq!(plan.pen_down_distance, 10.0);
    assert_eq!(plan.travel_distance, 0.0);
}

#[test]
fn test_long_path_uses_accelerated_moves_and_returns_home() {
    let planner = MotionPlanner::new(&config(PlanningConfig::default())).unwrap();
    let plan = planner
        .plan(&vec![vec![Point::new(10.0, 10.0), Point::new(110.0, 10.0)]])
        .unwrap();

    let kinds: Vec<CommandKind> = plan.commands.iter().map(|c| c.kind).collect();
    // triangular travel, pen down, trapezoidal draw, pen up, trapezoidal return
    assert_eq!(kinds.len(), 10);
    assert!(kinds[..2].iter().all(|k| *k == CommandKind::AcceleratedMove));
    assert_eq!(kinds[2], CommandKind::Pen);
    assert!(kinds[3..6].iter().all(|k| *k == CommandKind::AcceleratedMove));
    assert_eq!(kinds[6], CommandKind::Pen);
    assert!(kinds[7..].iter().all(|k| *k == CommandKind::AcceleratedMove));

    let expected_travel = Point::new(10.0, 10.0).length() + Point::new(110.0, 10.0).length();
    assert!((plan.travel_distance - expected_travel).abs() < 1e-9);
    assert!((plan.pen_down_distance - 100.0).abs() < 1e-9);
    assert!(plan.duration().as_millis() > 2000);
}

#[test]
fn test_unreachable_speed_change_is_fatal() {
    let planner = MotionPlanner::new(&config(PlanningConfig::default())).unwrap();
    let mut segment = MotionSegment::new(Point::new(0.0, 0.0), Point::new(1.0, 0.0), 200.0);
    segment.entry_speed = 50.0;
    let err = planner.segment_commands(&segment, 50.0, 200.0).unwrap_err();
    assert!(matches!(err, PlanningError::SpeedDeltaExceeded { .. }));
}

#[test]
fn test_invalid_config_rejected() {
    let cfg = config(PlanningConfig {
        down_acceleration: 0.0,
        ..PlanningConfig::default()
    });
    assert!(matches!(
        MotionPlanner::new(&cfg),
        Err(PlanningError::InvalidConfig { .. })
    ));
}

#[test]
fn test_degenerate_paths_are_skipped() {
    let planner = MotionPlanner::new(&config(PlanningConfig {
        return_home: false,
        ..PlanningConfig::default()
    }))
    .unwrap();
    let plan = planner
        .plan(&vec![vec![Point::new(3.0, 3.0), Point::new(3.0, 3.0)]])
        .unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_planner_state_transitions() {
    assert!(PlannerState::Idle.can_transition_to(PlannerState::TravelToStart));
    assert!(PlannerState::PenDown.can_transition_to(PlannerState::Segment(0)));
    assert!(PlannerState::Segment(2).can_transition_to(PlannerState::Segment(3)));
    assert!(!PlannerState::Segment(2).can_transition_to(PlannerState::Segment(5)));
    assert!(!PlannerState::Idle.can_transition_to(PlannerState::PenDown));
}
