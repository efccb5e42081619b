use plotkit_core::{Bounds, Point};
use plotkit_optimizer::{Layout, Margins, OptimizationOptions};

#[test]
fn test_default_stage_order() {
    let opts = OptimizationOptions {
        randomize_start: true,
        seed: Some(1),
        ..OptimizationOptions::default()
    };
    let placement = Layout::default().placement(Bounds::from_rect(0.0, 0.0, 1.0, 1.0), None);
    let pipeline = opts.pipeline(Some(&placement));
    assert_eq!(
        pipeline.stage_names(),
        vec!["scale", "merge", "elide", "randomize_start", "reorder"]
    );
}

#[test]
fn test_disabled_stages_are_skipped() {
    let opts = OptimizationOptions {
        merge: false,
        elide: false,
        reorder: false,
        ..OptimizationOptions::default()
    };
    assert!(opts.pipeline(None).is_empty());
}

#[test]
fn test_full_run_scales_merges_and_orders() {
    let layout = Layout {
        paper_width: 100.0,
        paper_height: 100.0,
        margins: Margins::uniform(0.0),
        ..Layout::default()
    };
    let placement = layout.placement(Bounds::from_rect(0.0, 0.0, 10.0, 10.0), None);
    let pipeline = OptimizationOptions::default().pipeline(Some(&placement));

    let paths = vec![
        vec![Point::new(9.0, 9.0), Point::new(9.5, 9.0), Point::new(10.0, 9.0)],
        // shorter than the minimum once scaled
        vec![Point::new(5.0, 5.0), Point::new(5.001, 5.0)],
        vec![Point::new(1.0, 0.0), Point::new(0.0, 0.0)],
    ];
    let out = pipeline.run(paths);
    assert_eq!(
        out,
        vec![
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            vec![Point::new(90.0, 90.0), Point::new(100.0, 90.0)],
        ]
    );
}

#[test]
fn test_invalid_options_rejected() {
    let opts = OptimizationOptions {
        merge_distance: -1.0,
        ..OptimizationOptions::default()
    };
    assert!(opts.validate().is_err());
    assert!(OptimizationOptions::default().validate().is_ok());
}
