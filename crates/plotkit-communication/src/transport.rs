//! Byte transport abstraction
//!
//! The controller talks to the board through a [`Transport`], a blocking
//! byte pipe with a short read timeout. Opening transports goes through a
//! [`Connector`] so discovery and reconnection can be swapped out in tests.

use async_trait::async_trait;
use plotkit_core::ProtocolError;
use std::io;

/// Blocking byte pipe to the board
///
/// `read` may return `Ok(0)` or an `io::ErrorKind::TimedOut` error when no
/// data arrives within the transport's internal poll interval; callers treat
/// both as "nothing yet".
pub trait Transport: Send {
    /// Write some bytes, returning how many were accepted
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Wait until written bytes have left the host
    fn flush(&mut self) -> io::Result<()>;

    /// Read available bytes
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Discard buffered input
    fn clear_input(&mut self) -> io::Result<()>;

    /// Fail once the underlying device has gone away
    fn check_alive(&mut self) -> io::Result<()>;

    /// Port name for logs and events
    fn name(&self) -> String;
}

/// Opens transports, finding the board first if needed
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Transport>, ProtocolError>;
}
