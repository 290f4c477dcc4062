//! Core traits for serial port abstraction.
//!
//! `SerialPortAdapter` lets real devices and the mock be used interchangeably
//! by the session reader, and `PortOpener` lets the session open whichever
//! flavour it was built with when a connection (re)starts.

use super::error::PortError;
use std::time::Duration;

/// Read timeout used for device connections.
///
/// The reader polls in slices of this length so a stop request is noticed
/// without waiting for the device to send anything.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Parameters used to open a serial device.
///
/// Framing is fixed at 8 data bits, 1 stop bit, no parity and no flow
/// control, which is what the encoder firmware speaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Read timeout.
    pub timeout: Duration,
}

impl PortConfiguration {
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self::new(9600)
    }
}

/// Trait for serial port I/O operations.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read. A read that times out
    /// returns an error for which [`PortError::is_transient`] is true.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Set the read timeout for this port.
    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError>;

    /// Discard anything already sitting in the receive and transmit buffers.
    fn clear_buffers(&mut self) -> Result<(), PortError>;
}

/// Opens serial devices by name.
///
/// Sessions hold one of these instead of calling into `serialport` directly,
/// so tests can hand out mock ports.
pub trait PortOpener: Send + Sync {
    fn open(
        &self,
        port_name: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}
