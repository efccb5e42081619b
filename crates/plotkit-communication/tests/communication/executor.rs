use crate::mock::{connected, Reply};
use plotkit_communication::{Ebb, PlotJob};
use plotkit_core::{ControllerEvent, MachineConfig, Point, ProtocolError, ServoConfig};
use plotkit_planner::{MotionPlanner, Plan};

fn machine() -> MachineConfig {
    MachineConfig {
        servo: ServoConfig {
            duration_ms: 0,
            ..ServoConfig::default()
        },
        ..MachineConfig::default()
    }
}

fn square_plan(config: &MachineConfig) -> Plan {
    let square = vec![
        Point::new(10.0, 10.0),
        Point::new(30.0, 10.0),
        Point::new(30.0, 30.0),
        Point::new(10.0, 30.0),
        Point::new(10.0, 10.0),
    ];
    MotionPlanner::new(config).unwrap().plan(&vec![square]).unwrap()
}

#[tokio::test]
async fn test_job_dispatches_every_command_in_order() {
    let (controller, board) = connected().await;
    let config = machine();
    let ebb = Ebb::new(controller.clone(), &config);
    let plan = square_plan(&config);
    let mut rx = controller.subscribe();

    let report = PlotJob::new(&ebb).without_pacing().run(&plan).await.unwrap();
    assert_eq!(report.commands_sent, plan.len());

    let written = board.written();
    assert_eq!(
        &written[..6],
        &["QC", "EM,1,1", "SC,4,17750", "SC,5,7500", "SC,10,0", "SP,1,0"]
    );
    let dispatched: Vec<&str> = plan.commands.iter().map(|c| c.wire.as_str()).collect();
    assert_eq!(&written[6..written.len() - 1], dispatched.as_slice());
    assert_eq!(written.last().map(String::as_str), Some("EM,0,0"));

    let progress: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .filter_map(|e| match e {
            ControllerEvent::JobProgress { done, total } => Some((done, total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), plan.len());
    assert_eq!(progress.last(), Some(&(plan.len(), plan.len())));
    assert!(!controller.is_job_active());
}

#[tokio::test]
async fn test_failed_command_raises_pen_and_releases_motors() {
    let (controller, board) = connected().await;
    board.reply_to("LM", Reply::Silent);
    let config = machine();
    let ebb = Ebb::new(controller.clone(), &config);
    let plan = square_plan(&config);

    let err = PlotJob::new(&ebb)
        .without_pacing()
        .run(&plan)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ProtocolError::ReadTimeout { ref command, .. } if command.starts_with("LM")
    ));

    let written = board.written();
    let failed_at = written.iter().position(|c| c.starts_with("LM")).unwrap();
    assert_eq!(&written[failed_at + 1..], &["SP,1,0", "EM,0,0"]);
    assert!(controller.is_connected());
    assert!(!controller.is_job_active());
}

#[tokio::test]
async fn test_low_power_aborts_before_motion() {
    let (controller, board) = connected().await;
    board.reply_to("QC", Reply::Text("0000,0050\r\nOK\r\n".to_string()));
    let config = machine();
    let ebb = Ebb::new(controller, &config);

    let err = PlotJob::new(&ebb)
        .without_pacing()
        .run(&square_plan(&config))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::LowPower { .. }));
    assert!(!board.written().iter().any(|c| c.starts_with("LM") || c == "EM,1,1"));
}

#[tokio::test]
async fn test_disconnect_mid_job_is_fatal() {
    let (controller, board) = connected().await;
    board.reply_to("SP,0", Reply::Unplug);
    let config = machine();
    let ebb = Ebb::new(controller.clone(), &config);

    let err = PlotJob::new(&ebb)
        .without_pacing()
        .run(&square_plan(&config))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionLost { .. }));
    assert!(!controller.is_connected());
    assert!(!controller.is_job_active());
    assert_eq!(board.written().last().map(String::as_str), Some("SP,0,0"));
}

#[tokio::test]
async fn test_job_needs_connection() {
    let (controller, _board) = connected().await;
    controller.disconnect().await.unwrap();
    let config = machine();
    let ebb = Ebb::new(controller, &config);

    let err = PlotJob::new(&ebb).run(&Plan::default()).await.unwrap_err();
    assert_eq!(err, ProtocolError::NotConnected);
}
