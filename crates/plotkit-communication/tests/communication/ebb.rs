use crate::mock::{connected, Reply};
use plotkit_communication::{Ebb, EbbController};
use plotkit_core::{Error, MachineConfig, ProtocolError, ServoConfig};

fn machine() -> MachineConfig {
    MachineConfig {
        servo: ServoConfig {
            duration_ms: 0,
            ..ServoConfig::default()
        },
        ..MachineConfig::default()
    }
}

#[tokio::test]
async fn test_query_voltage() {
    let (controller, _board) = connected().await;
    let ebb = Ebb::new(controller, &machine());

    let reading = ebb.query_voltage().await.unwrap();
    assert_eq!(reading.voltage_raw, 338);
    assert!(reading.voltage() > 11.9 && reading.voltage() < 12.1);
}

#[tokio::test]
async fn test_garbled_power_reply() {
    let (controller, board) = connected().await;
    board.reply_to("QC", Reply::Ack);
    let ebb = Ebb::new(controller, &machine());

    assert!(matches!(
        ebb.query_voltage().await,
        Err(ProtocolError::InvalidResponse { .. })
    ));
}

#[tokio::test]
async fn test_enable_motors_checks_power_first() {
    let (controller, board) = connected().await;
    let ebb = Ebb::new(controller, &machine());

    ebb.enable_motors(2).await.unwrap();
    assert_eq!(board.written(), vec!["QC".to_string(), "EM,2,2".to_string()]);
}

#[tokio::test]
async fn test_low_power_blocks_motors() {
    let (controller, board) = connected().await;
    board.reply_to("QC", Reply::Text("0000,0100\r\nOK\r\n".to_string()));
    let ebb = Ebb::new(controller, &machine());

    let err = ebb.enable_motors(1).await.unwrap_err();
    assert!(matches!(err, ProtocolError::LowPower { minimum, .. } if minimum == 8.5));
    assert!(!board.written().iter().any(|c| c.starts_with("EM")));
}

#[tokio::test]
async fn test_invalid_step_mode_never_reaches_board() {
    let (controller, board) = connected().await;
    let ebb = Ebb::new(controller, &machine());

    assert!(ebb.enable_motors(0).await.is_err());
    assert!(ebb.enable_motors(6).await.is_err());
    assert!(board.written().is_empty());
}

#[tokio::test]
async fn test_servo_and_pen_commands() {
    let (controller, board) = connected().await;
    let ebb = Ebb::new(controller, &machine());

    ebb.configure_servo().await.unwrap();
    ebb.pen_down().await.unwrap();
    ebb.pen_up_at(100.0).await.unwrap();
    assert_eq!(
        board.written(),
        vec![
            "SC,4,17750".to_string(),
            "SC,5,7500".to_string(),
            "SC,10,0".to_string(),
            "SP,0,0".to_string(),
            "SC,4,28000".to_string(),
            "SP,1,0".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_jog_encodes_constant_move() {
    let (controller, board) = connected().await;
    let mut config = machine();
    config.stepper.corexy = false;
    let ebb = Ebb::new(controller, &config);

    // 0.05 mm at 50 mm/s lasts 1 ms
    ebb.jog(0.05, 0.0, 50.0).await.unwrap();
    assert_eq!(board.written(), vec!["SM,1,4,0".to_string()]);

    let err = ebb.jog(0.0, 0.0, 10.0).await.unwrap_err();
    assert!(matches!(err, Error::Planning(_)));
}

#[tokio::test]
async fn test_reboot_closes_connection() {
    let (controller, board) = connected().await;
    let ebb = Ebb::new(controller.clone(), &machine());

    ebb.reboot().await.unwrap();
    assert_eq!(board.written(), vec!["RB".to_string()]);
    assert!(!controller.is_connected());
    assert!(matches!(
        ebb.emergency_stop().await,
        Err(ProtocolError::NotConnected)
    ));
}

#[tokio::test]
async fn test_version_and_stop() {
    let (controller, board) = connected().await;
    board.reply_to("V", Reply::Text("EBBv13_and_above EB Firmware Version 2.8.1\r\n".to_string()));
    let ebb = Ebb::new(controller, &machine());

    assert!(ebb.query_version().await.unwrap().starts_with("EBB"));
    ebb.emergency_stop().await.unwrap();
    assert_eq!(board.written().last().map(String::as_str), Some("ES"));
}

#[tokio::test]
async fn test_disconnected_board_reports_not_connected() {
    let ebb = Ebb::new(EbbController::default(), &machine());
    assert!(matches!(
        ebb.pen_up().await,
        Err(ProtocolError::NotConnected)
    ));
}
