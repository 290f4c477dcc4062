//! Serial device implementation backed by the `serialport` crate.

use super::error::PortError;
use super::traits::{PortConfiguration, PortOpener, SerialPortAdapter};
use std::io::Read;
use std::time::Duration;

/// A real serial device.
pub struct SyncSerialPort {
    port: Box<dyn serialport::SerialPort>,
    name: String,
}

impl SyncSerialPort {
    /// Open a serial port with 8N1 framing and no flow control.
    ///
    /// # Example
    /// ```no_run
    /// use rotary_mixer::port::{PortConfiguration, SyncSerialPort};
    ///
    /// let port = SyncSerialPort::open("/dev/ttyUSB0", &PortConfiguration::new(9600))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(port_name: &str, config: &PortConfiguration) -> Result<Self, PortError> {
        let port = serialport::new(port_name, config.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .timeout(config.timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => PortError::not_found(port_name),
                serialport::ErrorKind::InvalidInput => PortError::config(e.to_string()),
                _ => PortError::Serial(e),
            })?;

        Ok(Self {
            port,
            name: port_name.to_string(),
        })
    }
}

impl SerialPortAdapter for SyncSerialPort {
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        self.port.read(buffer).map_err(PortError::Io)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.port.set_timeout(timeout).map_err(PortError::Serial)
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        self.port
            .clear(serialport::ClearBuffer::All)
            .map_err(PortError::Serial)
    }
}

impl std::fmt::Debug for SyncSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSerialPort")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate().ok())
            .finish()
    }
}

/// Opens real devices through `serialport`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemPortOpener;

impl PortOpener for SystemPortOpener {
    fn open(
        &self,
        port_name: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let mut port = SyncSerialPort::open(port_name, config)?;
        // Stale bytes from before we connected would be misread as input.
        port.clear_buffers()?;
        Ok(Box::new(port))
    }
}

/// Names of the serial devices currently present on the system.
pub fn available_ports() -> Result<Vec<String>, PortError> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}
