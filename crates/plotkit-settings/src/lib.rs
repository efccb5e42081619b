//! PlotKit Settings Crate
//!
//! Loads, validates and saves application configuration.

pub mod config;
pub mod error;

pub use config::{Config, ConfigFormat, ConnectionSettings, LayoutSettings};
pub use error::{SettingsError, SettingsResult};
