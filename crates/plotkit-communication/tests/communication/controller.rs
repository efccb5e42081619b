use crate::mock::{connected, test_config, MockBoard, MockConnector, Reply};
use plotkit_communication::EbbController;
use plotkit_core::{ConnectionState, ControllerEvent, LinkState, ProtocolError};
use std::time::Duration;

#[tokio::test]
async fn test_connect_flushes_stale_input() {
    let board = MockBoard::new();
    board.push_stale("garbage from a previous session\r\n");
    let controller = EbbController::new(test_config());
    let connector = MockConnector::new(board.clone(), 0);

    controller.connect_with(&connector).await.unwrap();
    assert_eq!(controller.state(), ConnectionState::Connected(LinkState::Idle));
    assert_eq!(controller.port_name().as_deref(), Some("mock0"));

    let reply = controller.command("V").await.unwrap();
    assert_eq!(reply, vec!["OK".to_string()]);
}

#[tokio::test]
async fn test_connect_twice_is_rejected() {
    let (controller, board) = connected().await;
    assert_eq!(
        controller.attach(board.transport()).await,
        Err(ProtocolError::AlreadyConnected)
    );
}

#[tokio::test]
async fn test_failed_connect_returns_to_disconnected() {
    let board = MockBoard::new();
    let controller = EbbController::new(test_config());
    let connector = MockConnector::new(board, 1);

    assert_eq!(
        controller.connect_with(&connector).await,
        Err(ProtocolError::BoardNotFound)
    );
    assert_eq!(controller.state(), ConnectionState::Disconnected);
    controller.connect_with(&connector).await.unwrap();
    assert!(controller.is_connected());
}

#[tokio::test]
async fn test_command_collects_lines_until_ack() {
    let (controller, board) = connected().await;
    board.reply_to("QC", Reply::Text("0100,0338\r\nOK\r\n".to_string()));

    let lines = controller.command("QC").await.unwrap();
    assert_eq!(lines, vec!["0100,0338".to_string(), "OK".to_string()]);
    assert_eq!(board.written(), vec!["QC".to_string()]);
}

#[tokio::test]
async fn test_query_line_returns_first_line() {
    let (controller, board) = connected().await;
    board.reply_to(
        "V",
        Reply::Text("EBBv13_and_above EB Firmware Version 2.8.1\r\n".to_string()),
    );

    let version = controller.query_line("V").await.unwrap();
    assert!(version.contains("2.8.1"));
}

#[tokio::test]
async fn test_error_reply_is_rejected() {
    let (controller, board) = connected().await;
    board.reply_to("XX", Reply::Text("!8 Err: Unknown command 'XX:58'\r\n".to_string()));

    let err = controller.command("XX").await.unwrap_err();
    assert!(matches!(err, ProtocolError::Rejected { ref command, .. } if command == "XX"));
    assert!(controller.is_connected());
}

#[tokio::test]
async fn test_second_transaction_fails_busy() {
    let (controller, board) = connected().await;
    board.reply_to("SM", Reply::Silent);

    let background = controller.clone();
    let pending = tokio::spawn(async move { background.command("SM,100,1,1").await });

    // wait for the first transaction to take the link
    while controller.state() != ConnectionState::Connected(LinkState::AwaitingAck) {
        tokio::task::yield_now().await;
    }
    assert_eq!(controller.command("QC").await, Err(ProtocolError::Busy));

    let first = pending.await.unwrap();
    assert!(matches!(first, Err(ProtocolError::ReadTimeout { .. })));
}

#[tokio::test]
async fn test_read_timeout_keeps_connection() {
    let (controller, board) = connected().await;
    board.reply_to("SP", Reply::Silent);

    let err = controller.command("SP,1,200").await.unwrap_err();
    assert_eq!(
        err,
        ProtocolError::ReadTimeout {
            command: "SP,1,200".to_string(),
            timeout_ms: 100,
        }
    );
    assert_eq!(controller.state(), ConnectionState::Connected(LinkState::Idle));
    assert!(controller.command("EM,1,1").await.is_ok());
}

#[tokio::test]
async fn test_write_timeout_keeps_connection() {
    let (controller, board) = connected().await;
    board.stall_writes();

    let err = controller.command("EM,1,1").await.unwrap_err();
    assert_eq!(err, ProtocolError::WriteTimeout { timeout_ms: 50 });
    assert!(controller.is_connected());
}

#[tokio::test]
async fn test_unplug_publishes_disconnect() {
    let (controller, board) = connected().await;
    let mut rx = controller.subscribe();
    board.reply_to("LM", Reply::Unplug);

    let err = controller.command("LM,1,1,1,1,1,1,3").await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionLost { .. }));
    assert_eq!(controller.state(), ConnectionState::Disconnected);
    assert_eq!(controller.command("QC").await, Err(ProtocolError::NotConnected));

    let mut saw_lost = false;
    while let Ok(event) = rx.try_recv() {
        if event == (ControllerEvent::Disconnected { requested: false }) {
            saw_lost = true;
        }
    }
    assert!(saw_lost);
}

#[tokio::test]
async fn test_requested_disconnect() {
    let (controller, _board) = connected().await;
    let mut rx = controller.subscribe();

    controller.disconnect().await.unwrap();
    assert_eq!(controller.state(), ConnectionState::Disconnected);
    assert!(controller.port_name().is_none());

    let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert_eq!(
        events,
        vec![
            ControllerEvent::StateChanged(ConnectionState::Disconnected),
            ControllerEvent::Disconnected { requested: true },
        ]
    );
}

#[tokio::test]
async fn test_job_guard_is_exclusive() {
    let (controller, _board) = connected().await;
    let guard = controller.begin_job().unwrap();
    assert!(controller.is_job_active());
    assert!(matches!(controller.begin_job(), Err(ProtocolError::Busy)));
    drop(guard);
    assert!(!controller.is_job_active());
    assert!(controller.begin_job().is_ok());
}

#[tokio::test]
async fn test_job_handle_owns_the_connection() {
    let (controller, board) = connected().await;
    let guard = controller.begin_job().unwrap();

    assert_eq!(controller.command("QC").await, Err(ProtocolError::Busy));
    let other = controller.clone();
    assert_eq!(other.command("EM,0,0").await, Err(ProtocolError::Busy));
    assert!(guard.controller().command("EM,1,1").await.is_ok());
    assert_eq!(board.written(), vec!["EM,1,1".to_string()]);

    drop(guard);
    assert!(controller.command("QC").await.is_ok());
}

#[tokio::test]
async fn test_abandoned_transaction_releases_link() {
    let (controller, board) = connected().await;
    board.reply_to("SM", Reply::Silent);

    let abandoned =
        tokio::time::timeout(Duration::from_millis(10), controller.command("SM,100,1,1")).await;
    assert!(abandoned.is_err());

    // the read timeout is 100 ms; the link is back well after that
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(controller.state(), ConnectionState::Connected(LinkState::Idle));
    assert!(controller.command("QC").await.is_ok());
}

#[tokio::test]
async fn test_idle_unplug_is_detected() {
    let (controller, board) = connected().await;
    let mut rx = controller.subscribe();

    assert!(controller.check_link().is_ok());
    board.unplug();
    let err = controller.check_link().unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionLost { .. }));
    assert_eq!(controller.state(), ConnectionState::Disconnected);

    let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert!(events.contains(&ControllerEvent::Disconnected { requested: false }));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, ControllerEvent::Disconnected { .. }))
            .count(),
        1
    );

    // nothing left to probe
    assert!(controller.check_link().is_ok());
}
