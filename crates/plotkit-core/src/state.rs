//! Connection state machine
//!
//! The controller owns exactly one [`ConnectionState`]. Board I/O is only
//! permitted in `Connected`, and only one transaction may be `AwaitingAck`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transaction sub-state of an open connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkState {
    /// Ready to accept a write
    Idle,
    /// A command is written and its acknowledgment is pending
    AwaitingAck,
}

/// Connection state of the serial protocol controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// No port is open
    Disconnected,
    /// A port is being opened
    Connecting,
    /// The port is open
    Connected(LinkState),
}

impl ConnectionState {
    /// Check if a transition from this state to `target` is valid.
    ///
    /// Returns `true` for valid transitions:
    /// - Disconnected → Connecting
    /// - Connecting → Connected(Idle), Disconnected
    /// - Connected(Idle) ↔ Connected(AwaitingAck)
    /// - Connected(_) → Disconnected
    pub fn can_transition_to(&self, target: ConnectionState) -> bool {
        use ConnectionState::*;
        use LinkState::*;
        if *self == target {
            return true;
        }
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected(Idle) | Disconnected)
                | (Connected(Idle), Connected(AwaitingAck))
                | (Connected(AwaitingAck), Connected(Idle))
                | (Connected(_), Disconnected)
        )
    }

    /// Check if the port is open
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected(LinkState::Idle) => write!(f, "Connected"),
            Self::Connected(LinkState::AwaitingAck) => write!(f, "Connected (awaiting ack)"),
        }
    }
}
