//! # PlotKit Core
//!
//! Core types shared by every PlotKit crate: plot geometry, the immutable
//! machine configuration, the connection state machine, controller events and
//! the error taxonomy.

pub mod error;
pub mod event;
pub mod geometry;
pub mod machine;
pub mod state;

pub use error::{Error, ParseError, PlanningError, ProtocolError, Result};
pub use event::{ControllerEvent, EventDispatcher};
pub use geometry::{path_length, Bounds, Path, PathList, Point};
pub use machine::{MachineConfig, PlanningConfig, PowerConfig, ServoConfig, StepperConfig};
pub use state::{ConnectionState, LinkState};
