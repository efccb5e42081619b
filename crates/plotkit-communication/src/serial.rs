//! Serial port discovery and transport
//!
//! Provides:
//! - Port enumeration
//! - EiBotBoard detection by USB identity
//! - A [`Transport`] over a real serial port
//! - A [`Connector`] that discovers and opens the board

use crate::transport::{Connector, Transport};
use async_trait::async_trait;
use plotkit_core::ProtocolError;
use std::io::{self, Read, Write};
use std::time::Duration;

/// Default EiBotBoard baud rate
pub const DEFAULT_BAUD_RATE: u32 = 9600;
/// Manufacturer strings reported by the board
pub const EBB_MANUFACTURERS: [&str; 2] = ["SchmalzHaus", "SchmalzHaus LLC"];
/// Substring matched where the platform reports a driver vendor instead
pub const EBB_MANUFACTURER_HINT: &str = "SchmalzHaus";
/// USB vendor id
pub const EBB_VENDOR_ID: u16 = 0x04D8;
/// USB product id
pub const EBB_PRODUCT_ID: u16 = 0xFD92;

/// Poll interval for reads on an open port
const READ_POLL: Duration = Duration::from_millis(10);

/// Information about an available serial port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyACM0", "COM3")
    pub port_name: String,
    /// Manufacturer name if available
    pub manufacturer: Option<String>,
    /// USB vendor ID if applicable
    pub vid: Option<u16>,
    /// USB product ID if applicable
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            manufacturer: None,
            vid: None,
            pid: None,
        }
    }

    /// Set manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set USB IDs
    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }
}

/// How a board is recognised among the enumerated ports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryRule {
    /// Exact manufacturer string plus product id
    ManufacturerAndProduct,
    /// Manufacturer substring only; product ids are unreliable on this platform
    ManufacturerSubstring,
}

impl DiscoveryRule {
    /// Rule for the platform this binary runs on
    pub fn for_platform() -> Self {
        if cfg!(windows) {
            Self::ManufacturerSubstring
        } else {
            Self::ManufacturerAndProduct
        }
    }

    /// Check whether `port` looks like an EiBotBoard
    pub fn matches(&self, port: &SerialPortInfo) -> bool {
        let Some(manufacturer) = port.manufacturer.as_deref() else {
            return false;
        };
        match self {
            Self::ManufacturerAndProduct => {
                EBB_MANUFACTURERS.contains(&manufacturer) && port.pid == Some(EBB_PRODUCT_ID)
            }
            Self::ManufacturerSubstring => manufacturer.contains(EBB_MANUFACTURER_HINT),
        }
    }
}

/// List serial ports on the system
pub fn list_ports() -> Result<Vec<SerialPortInfo>, ProtocolError> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        ProtocolError::Io {
            reason: format!("Failed to enumerate ports: {}", e),
        }
    })?;

    Ok(ports
        .into_iter()
        .map(|port| {
            let info = SerialPortInfo::new(&port.port_name);
            match port.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    let info = info.with_usb_ids(usb.vid, usb.pid);
                    match usb.manufacturer {
                        Some(mfg) => info.with_manufacturer(mfg),
                        None => info,
                    }
                }
                _ => info,
            }
        })
        .collect())
}

/// First port matching `rule`
pub fn find_board(ports: &[SerialPortInfo], rule: DiscoveryRule) -> Option<&SerialPortInfo> {
    ports.iter().find(|p| rule.matches(p))
}

/// Transport over an open serial port
pub struct SerialTransport {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl SerialTransport {
    /// Open `port_name` at `baud_rate` with a short poll timeout
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, ProtocolError> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(READ_POLL)
            .open()
            .map_err(|e| {
                tracing::warn!("Failed to open serial port {}: {}", port_name, e);
                ProtocolError::FailedToOpen {
                    port: port_name.to_string(),
                    reason: e.to_string(),
                }
            })?;
        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.port.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::from)
    }

    fn check_alive(&mut self) -> io::Result<()> {
        self.port
            .bytes_to_read()
            .map(|_| ())
            .map_err(io::Error::from)
    }

    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Connector for a named port, or the first discovered board
#[derive(Debug, Clone)]
pub struct SerialConnector {
    /// Explicit port; `None` discovers the board
    pub port: Option<String>,
    pub baud_rate: u32,
}

impl SerialConnector {
    pub fn new(port: Option<String>, baud_rate: u32) -> Self {
        Self { port, baud_rate }
    }

    /// Resolve the port name, running discovery if none was given
    pub async fn resolve_port(&self) -> Result<String, ProtocolError> {
        if let Some(port) = &self.port {
            return Ok(port.clone());
        }
        let ports = tokio::task::spawn_blocking(list_ports)
            .await
            .map_err(|e| ProtocolError::Io {
                reason: e.to_string(),
            })??;
        let found = find_board(&ports, DiscoveryRule::for_platform())
            .ok_or(ProtocolError::BoardNotFound)?;
        tracing::info!("Found plotter board on {}", found.port_name);
        Ok(found.port_name.clone())
    }
}

impl Default for SerialConnector {
    fn default() -> Self {
        Self::new(None, DEFAULT_BAUD_RATE)
    }
}

#[async_trait]
impl Connector for SerialConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, ProtocolError> {
        let port = self.resolve_port().await?;
        let baud = self.baud_rate;
        let transport = tokio::task::spawn_blocking(move || SerialTransport::open(&port, baud))
            .await
            .map_err(|e| ProtocolError::Io {
                reason: e.to_string(),
            })??;
        Ok(Box::new(transport))
    }
}
