//! # PlotKit Communication
//!
//! Serial link to an EiBotBoard-driven pen plotter.
//!
//! - [`serial`]: port discovery and the serial transport
//! - [`controller`]: connection state machine and acknowledged transactions
//! - [`ebb`]: board control plane (power, motors, servo, pen, jog)
//! - [`executor`]: runs a planned job command by command
//! - [`reconnect`]: idle link probing and reconnect after the board goes away

pub mod controller;
pub mod ebb;
pub mod executor;
pub mod reconnect;
pub mod serial;
pub mod transport;

pub use controller::{ControllerConfig, EbbController, JobGuard, ReplyMode, ACK_TOKEN};
pub use ebb::{Ebb, PowerReading};
pub use executor::{JobReport, PlotJob};
pub use reconnect::{spawn_link_monitor, spawn_reconnect_loop};
pub use serial::{
    find_board, list_ports, DiscoveryRule, SerialConnector, SerialPortInfo, SerialTransport,
    DEFAULT_BAUD_RATE,
};
pub use transport::{Connector, Transport};
