//! Configuration for PlotKit
//!
//! Configuration is organized into sections:
//! - Connection settings (port, baud rate, timeouts, reconnect)
//! - Machine configuration (steppers, servo, kinematic limits, power)
//! - Path optimization options
//! - Page layout and excluded layers
//!
//! Files are JSON or TOML, picked by extension, and live in the platform
//! config directory unless a path is given.

use crate::error::{SettingsError, SettingsResult};
use plotkit_communication::{ControllerConfig, SerialConnector, DEFAULT_BAUD_RATE};
use plotkit_core::MachineConfig;
use plotkit_optimizer::{Layout, OptimizationOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name under the platform config dir
const APP_DIR: &str = "plotkit";
/// Default config file name
const CONFIG_FILE: &str = "config.toml";

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension
    pub fn from_path(path: &Path) -> SettingsResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(SettingsError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

/// Connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Serial port; discovered automatically when absent
    pub port: Option<String>,
    /// Baud rate for the serial connection
    pub baud_rate: u32,
    /// Write timeout in milliseconds
    pub write_timeout_ms: u64,
    /// Reply timeout in milliseconds
    pub read_timeout_ms: u64,
    /// Reconnect after the board goes away outside a job
    pub auto_reconnect: bool,
    /// Delay between reconnect attempts in milliseconds
    pub reconnect_delay_ms: u64,
    /// How often an idle link is probed for a vanished port, in milliseconds
    pub link_check_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        let timeouts = ControllerConfig::default();
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            write_timeout_ms: timeouts.write_timeout_ms,
            read_timeout_ms: timeouts.read_timeout_ms,
            auto_reconnect: true,
            reconnect_delay_ms: 2000,
            link_check_ms: 500,
        }
    }
}

impl ConnectionSettings {
    pub fn controller_config(&self) -> ControllerConfig {
        ControllerConfig {
            write_timeout_ms: self.write_timeout_ms,
            read_timeout_ms: self.read_timeout_ms,
        }
    }

    pub fn connector(&self) -> SerialConnector {
        SerialConnector::new(self.port.clone(), self.baud_rate)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn link_check_interval(&self) -> Duration {
        Duration::from_millis(self.link_check_ms)
    }
}

/// Page layout plus layer filtering
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub layout: Layout,
    /// Layer ids left out of the plot
    pub excluded_layers: Vec<String>,
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionSettings,
    pub machine: MachineConfig,
    pub optimization: OptimizationOptions,
    pub layout: LayoutSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no config directory on this platform".to_string())
            })
    }

    /// Load from `path`, or from the default location when it exists
    ///
    /// Falls back to defaults when no path is given and no default file exists.
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match Self::default_path() {
            Ok(default) if default.exists() => Self::load_from_file(&default),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::from_path(path)?;
        let content = std::fs::read_to_string(path)?;
        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };
        config.validate()?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML), creating parent directories
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;
        let format = ConfigFormat::from_path(path)?;
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let connection = &self.connection;
        if connection.baud_rate == 0 {
            return Err(SettingsError::invalid("connection.baud_rate", "must be > 0"));
        }
        if connection.write_timeout_ms == 0 || connection.read_timeout_ms == 0 {
            return Err(SettingsError::invalid(
                "connection.timeouts",
                "write and read timeouts must be > 0",
            ));
        }
        if connection.auto_reconnect && connection.reconnect_delay_ms == 0 {
            return Err(SettingsError::invalid(
                "connection.reconnect_delay_ms",
                "must be > 0 when auto_reconnect is on",
            ));
        }
        if connection.link_check_ms == 0 {
            return Err(SettingsError::invalid("connection.link_check_ms", "must be > 0"));
        }

        self.machine
            .validate()
            .map_err(|e| SettingsError::invalid("machine", e.to_string()))?;
        self.optimization
            .validate()
            .map_err(|reason| SettingsError::invalid("optimization", reason))?;
        self.layout
            .layout
            .validate()
            .map_err(|reason| SettingsError::invalid("layout", reason))?;
        Ok(())
    }
}
