//! Session-level link supervision
//!
//! [`spawn_link_monitor`] probes the idle link so an unplugged board is noticed
//! without a command in flight. [`spawn_reconnect_loop`] watches controller
//! events and, after an unrequested disconnect, retries the connector on a
//! fixed delay. Retries wait while a job still holds the connection; the job
//! itself is never resumed.

use crate::controller::EbbController;
use crate::transport::Connector;
use plotkit_core::{ControllerEvent, ProtocolError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Spawn the idle-link probe; abort the handle to stop it
pub fn spawn_link_monitor(controller: EbbController, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = controller.check_link() {
                tracing::warn!("Idle link check failed: {}", e);
            }
        }
    })
}

/// Spawn the reconnect task; abort the handle to stop it
pub fn spawn_reconnect_loop(
    controller: EbbController,
    connector: Arc<dyn Connector>,
    delay: Duration,
) -> JoinHandle<()> {
    let mut rx = controller.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ControllerEvent::Disconnected { requested: false }) => {
                    reconnect(&controller, connector.as_ref(), delay).await;
                }
                Ok(_) => {}
                Err(RecvError::Lagged(n)) => {
                    tracing::debug!("Reconnect watcher skipped {} events", n);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

async fn reconnect(controller: &EbbController, connector: &dyn Connector, delay: Duration) {
    let mut attempt = 0u32;
    loop {
        tokio::time::sleep(delay).await;
        if controller.is_connected() {
            return;
        }
        if controller.is_job_active() {
            tracing::debug!("Job still active; deferring reconnect");
            continue;
        }
        attempt += 1;
        match controller.connect_with(connector).await {
            Ok(()) => {
                tracing::info!("Reconnected after {} attempt(s)", attempt);
                return;
            }
            Err(ProtocolError::AlreadyConnected) => return,
            Err(e) => {
                tracing::warn!("Reconnect attempt {} failed: {}", attempt, e);
            }
        }
    }
}
