use crate::mock::{test_config, MockBoard, MockConnector, Reply};
use plotkit_core::ControllerEvent;
use plotkit_communication::{spawn_link_monitor, spawn_reconnect_loop, EbbController};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

const DELAY: Duration = Duration::from_millis(10);

async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

#[tokio::test]
async fn test_reconnects_after_unplug() {
    let board = MockBoard::new();
    board.reply_to("SM", Reply::Unplug);
    let connector = Arc::new(MockConnector::new(board.clone(), 0));
    let controller = EbbController::new(test_config());
    controller.connect_with(connector.as_ref()).await.unwrap();

    let handle = spawn_reconnect_loop(controller.clone(), connector.clone(), DELAY);
    assert!(controller.command("SM,10,1,1").await.is_err());
    assert!(!controller.is_connected());

    board.replug();
    assert!(wait_until(|| controller.is_connected()).await);
    assert!(connector.attempts.load(Ordering::SeqCst) >= 2);
    handle.abort();
}

#[tokio::test]
async fn test_requested_disconnect_is_not_retried() {
    let board = MockBoard::new();
    let connector = Arc::new(MockConnector::new(board, 0));
    let controller = EbbController::new(test_config());
    controller.connect_with(connector.as_ref()).await.unwrap();

    let handle = spawn_reconnect_loop(controller.clone(), connector.clone(), DELAY);
    controller.disconnect().await.unwrap();

    tokio::time::sleep(DELAY * 5).await;
    assert!(!controller.is_connected());
    assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);
    handle.abort();
}

#[tokio::test]
async fn test_waits_for_job_to_release_connection() {
    let board = MockBoard::new();
    board.reply_to("SM", Reply::Unplug);
    let connector = Arc::new(MockConnector::new(board.clone(), 0));
    let controller = EbbController::new(test_config());
    controller.connect_with(connector.as_ref()).await.unwrap();

    let handle = spawn_reconnect_loop(controller.clone(), connector.clone(), DELAY);
    let guard = controller.begin_job().unwrap();
    assert!(guard.controller().command("SM,10,1,1").await.is_err());
    board.replug();

    tokio::time::sleep(DELAY * 5).await;
    assert!(!controller.is_connected());
    assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);

    drop(guard);
    assert!(wait_until(|| controller.is_connected()).await);
    handle.abort();
}

#[tokio::test]
async fn test_idle_unplug_triggers_reconnect() {
    let board = MockBoard::new();
    let connector = Arc::new(MockConnector::new(board.clone(), 0));
    let controller = EbbController::new(test_config());
    controller.connect_with(connector.as_ref()).await.unwrap();
    let mut rx = controller.subscribe();

    let monitor = spawn_link_monitor(controller.clone(), DELAY);
    let reconnect = spawn_reconnect_loop(controller.clone(), connector.clone(), DELAY);
    board.unplug();
    assert!(wait_until(|| !controller.is_connected()).await);

    board.replug();
    assert!(wait_until(|| controller.is_connected()).await);
    assert!(connector.attempts.load(Ordering::SeqCst) >= 2);

    let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
    assert!(events.contains(&ControllerEvent::Disconnected { requested: false }));
    monitor.abort();
    reconnect.abort();
}
