//! Event system for controller communication
//!
//! Provides:
//! - Event types for connection and job state changes
//! - Event dispatcher for publishing events to subscribers
//!
//! Disconnect notifications reach interested parties through a subscription
//! rather than a stored callback.

use crate::state::ConnectionState;
use tokio::sync::broadcast;

/// Controller event types
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// Port opened
    Connected(String),
    /// Port closed, either on request or because the device went away
    Disconnected {
        /// Whether the closure was requested by the caller
        requested: bool,
    },
    /// Connection state changed
    StateChanged(ConnectionState),
    /// Command acknowledged by the board
    CommandComplete(String),
    /// Plot job progress
    JobProgress {
        /// Commands acknowledged so far
        done: usize,
        /// Commands in the plan
        total: usize,
    },
    /// Error occurred
    Error(String),
}

impl std::fmt::Display for ControllerEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerEvent::Connected(port) => write!(f, "Connected to {}", port),
            ControllerEvent::Disconnected { requested: true } => write!(f, "Disconnected"),
            ControllerEvent::Disconnected { requested: false } => write!(f, "Connection lost"),
            ControllerEvent::StateChanged(state) => write!(f, "State: {}", state),
            ControllerEvent::CommandComplete(cmd) => write!(f, "Command complete: {}", cmd),
            ControllerEvent::JobProgress { done, total } => {
                write!(f, "Progress: {}/{}", done, total)
            }
            ControllerEvent::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Event dispatcher for publishing events to subscribers
#[derive(Clone)]
pub struct EventDispatcher {
    /// Broadcast sender channel for controller events.
    tx: broadcast::Sender<ControllerEvent>,
}

impl EventDispatcher {
    /// Create a new event dispatcher
    ///
    /// # Arguments
    /// * `buffer_size` - Size of the broadcast buffer (default 100)
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer_size);
        Self { tx }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.tx.subscribe()
    }

    /// Publish an event to all subscribers
    ///
    /// Having no subscribers is not an error.
    pub fn publish(&self, event: ControllerEvent) {
        let _ = self.tx.send(event);
    }

    /// Get number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(100)
    }
}
