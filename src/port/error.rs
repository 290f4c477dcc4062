//! Port-specific error types.
//!
//! Kept apart from configuration and session errors so the device layer can be
//! swapped (real hardware, mock) without touching the callers' error handling.

use thiserror::Error;

/// Errors that can occur while opening or reading a serial device.
#[derive(Debug, Error)]
pub enum PortError {
    /// The named serial device does not exist on this system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred on an open device.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device rejected the requested parameters (bad baud rate, busy, ...).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A read returned no data within the configured timeout.
    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout(duration)
    }

    /// Whether the error only means "nothing arrived yet".
    ///
    /// Readers poll with a short timeout, so these are expected and must not
    /// end the read loop.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::Interrupted
            ),
            _ => false,
        }
    }
}
