//! # PlotKit
//!
//! SVG to pen plotter pipeline for EiBotBoard-driven machines.
//!
//! ## Architecture
//!
//! PlotKit is organized as a workspace with multiple crates:
//!
//! 1. **plotkit-core** - Geometry, machine configuration, errors, events
//! 2. **plotkit-svg** - SVG parsing and flattening into polylines
//! 3. **plotkit-optimizer** - Placement, merge, elide, loop seams, reordering
//! 4. **plotkit-planner** - Corner speeds, smoothing, profiles, `LM`/`SM` encoding
//! 5. **plotkit-communication** - Serial discovery, board protocol, job execution
//! 6. **plotkit-settings** - Configuration files
//! 7. **plotkit-pipeline** - Plot requests from SVG text to planned commands
//! 8. **plotkit** - This crate: logging setup and the command-line binary

pub use plotkit_communication::{
    spawn_link_monitor, spawn_reconnect_loop, ControllerConfig, Ebb, EbbController, JobReport,
    PlotJob, SerialConnector,
};
pub use plotkit_core::{
    Bounds, ControllerEvent, Error, MachineConfig, Path, PathList, Point, Result,
};
pub use plotkit_pipeline::{plan_plot, prepare_plot, PlotRequest, PreparedPlot};
pub use plotkit_settings::SettingsError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output
/// - RUST_LOG environment variable support
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
