//! Error handling for PlotKit
//!
//! Provides error types for every stage of a plot job:
//! - Parse errors (malformed SVG structure)
//! - Planning errors (physically invalid motion)
//! - Protocol errors (serial link and board replies)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// SVG parse error type
///
/// Raised when the document cannot be used at all. Fatal to the single plot
/// request; no partial output is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The text is not well-formed XML
    #[error("Invalid XML: {reason}")]
    InvalidXml {
        /// The reason reported by the XML parser.
        reason: String,
    },

    /// The document root is not an `<svg>` element
    #[error("Root element is <{found}>, expected <svg>")]
    MissingSvgRoot {
        /// The tag name of the root element found instead.
        found: String,
    },

    /// The root element carries no `viewBox`
    #[error("Root <svg> element has no viewBox attribute")]
    MissingViewBox,

    /// The `viewBox` attribute cannot be parsed or has a non-positive size
    #[error("Malformed viewBox '{value}'")]
    InvalidViewBox {
        /// The raw attribute value.
        value: String,
    },
}

/// Motion planning error type
///
/// Any of these aborts the job. They indicate either bad optimizer thresholds or
/// a smoothing defect, never a condition that can be clamped away.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    /// Entry/exit speed change is larger than the segment can physically deliver
    #[error(
        "Speed change {entry:.3} -> {exit:.3} mm/s exceeds {max_delta:.3} mm/s over {length:.4} mm"
    )]
    SpeedDeltaExceeded {
        /// Entry speed in mm/s.
        entry: f64,
        /// Exit speed in mm/s.
        exit: f64,
        /// Largest achievable speed change in mm/s.
        max_delta: f64,
        /// Segment length in mm.
        length: f64,
    },

    /// Both axes round to zero steps
    #[error("Move of {distance:.4} mm rounds to zero steps on both axes")]
    ZeroStepMove {
        /// The requested move distance in mm.
        distance: f64,
    },

    /// An accelerated move was requested with zero entry and exit speed
    #[error("Cannot encode a move with zero entry and exit speed")]
    StaticHold,

    /// A constant-velocity move was requested at zero speed
    #[error("Cannot encode a constant-velocity move at {speed} mm/s")]
    ZeroSpeed {
        /// The offending speed.
        speed: f64,
    },

    /// Machine configuration cannot be planned against
    #[error("Invalid machine configuration: {reason}")]
    InvalidConfig {
        /// The reason the configuration is unusable.
        reason: String,
    },
}

/// Serial protocol error type
///
/// Represents errors on the link to the controller board, including port
/// handling, transaction timeouts and board replies.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// A board call was attempted while not connected
    #[error("Board not connected")]
    NotConnected,

    /// Connect was called on an open connection
    #[error("Board already connected")]
    AlreadyConnected,

    /// Another transaction is awaiting its acknowledgment
    #[error("Transaction already in flight")]
    Busy,

    /// The write did not drain in time
    #[error("Write timed out after {timeout_ms}ms")]
    WriteTimeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// No acknowledgment arrived in time
    #[error("No acknowledgment for '{command}' after {timeout_ms}ms")]
    ReadTimeout {
        /// The command awaiting acknowledgment.
        command: String,
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// The port closed underneath an open connection
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// The reason the connection was lost.
        reason: String,
    },

    /// Supply voltage is too low to power the motors
    #[error("Supply voltage too low: {voltage:.2}V (minimum {minimum:.2}V)")]
    LowPower {
        /// Measured voltage in volts.
        voltage: f64,
        /// Configured minimum in volts.
        minimum: f64,
    },

    /// The board answered with an error line
    #[error("Board rejected '{command}': {reply}")]
    Rejected {
        /// The command that was rejected.
        command: String,
        /// The board's reply.
        reply: String,
    },

    /// The board answered with something that could not be interpreted
    #[error("Unexpected reply to '{command}': {reply}")]
    InvalidResponse {
        /// The command that was sent.
        command: String,
        /// The board's reply.
        reply: String,
    },

    /// Discovery found no matching board
    #[error("No plotter board found")]
    BoardNotFound,

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {reason}")]
    Io {
        /// The reason for the I/O error.
        reason: String,
    },
}

/// Main error type for PlotKit
///
/// A unified error type that can represent any error from all stages.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// SVG parse error
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Motion planning error
    #[error(transparent)]
    Planning(#[from] PlanningError),

    /// Serial protocol error
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a transaction timeout
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Protocol(ProtocolError::WriteTimeout { .. })
                | Error::Protocol(ProtocolError::ReadTimeout { .. })
        )
    }

    /// Check if this error means the board is no longer reachable
    pub fn is_disconnected(&self) -> bool {
        matches!(
            self,
            Error::Protocol(ProtocolError::NotConnected)
                | Error::Protocol(ProtocolError::ConnectionLost { .. })
        )
    }

    /// Check if this is a parse error
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Error::Parse(_))
    }

    /// Check if this is a planning error
    pub fn is_planning_error(&self) -> bool {
        matches!(self, Error::Planning(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
