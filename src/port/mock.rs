//! Mock serial port implementation for testing.
//!
//! `MockSerialPort` simulates a device without hardware. Clones share state,
//! so a test keeps one handle to feed bytes while the session reads from
//! another. `MockPortOpener` hands such ports to a session and records every
//! open request.

use super::error::PortError;
use super::traits::{PortConfiguration, PortOpener, SerialPortAdapter};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// How long an empty read pretends to wait before timing out.
const EMPTY_READ_DELAY: Duration = Duration::from_millis(5);

#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Once set, every read fails as if the device was unplugged.
    disconnected: bool,
    timeout: Duration,
    buffers_cleared: bool,
}

/// Mock serial port.
///
/// # Example
/// ```
/// use rotary_mixer::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"r\n");
///
/// let mut buffer = [0u8; 8];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"r\n");
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    state: Arc<Mutex<MockPortState>>,
}

impl MockSerialPort {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_millis(100),
                ..Default::default()
            })),
        }
    }

    /// Append bytes to be returned by subsequent reads.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.state.lock().read_queue.extend(data);
    }

    /// Make every following read fail with a broken-pipe error.
    pub fn disconnect(&mut self) {
        self.state.lock().disconnected = true;
    }

    pub fn was_cleared(&self) -> bool {
        self.state.lock().buffers_cleared
    }

    /// Number of queued bytes not yet read.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let timeout = {
            let mut state = self.state.lock();

            if state.disconnected {
                return Err(PortError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "device disconnected",
                )));
            }

            let mut bytes_read = 0;
            for byte in buffer.iter_mut() {
                match state.read_queue.pop_front() {
                    Some(queued) => {
                        *byte = queued;
                        bytes_read += 1;
                    }
                    None => break,
                }
            }

            if bytes_read > 0 {
                return Ok(bytes_read);
            }
            state.timeout
        };

        // Behave like a real port with a read timeout, without spinning.
        std::thread::sleep(EMPTY_READ_DELAY.min(timeout));
        Err(PortError::timeout(timeout))
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.state.lock().timeout = timeout;
        Ok(())
    }

    fn clear_buffers(&mut self) -> Result<(), PortError> {
        let mut state = self.state.lock();
        state.read_queue.clear();
        state.buffers_cleared = true;
        Ok(())
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// One recorded call to [`MockPortOpener::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub port_name: String,
    pub baud_rate: u32,
}

/// Hands out clones of a single [`MockSerialPort`].
#[derive(Clone)]
pub struct MockPortOpener {
    port: MockSerialPort,
    requests: Arc<Mutex<Vec<OpenRequest>>>,
    fail_next: Arc<Mutex<bool>>,
}

impl MockPortOpener {
    pub fn new(port: MockSerialPort) -> Self {
        Self {
            port,
            requests: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(Mutex::new(false)),
        }
    }

    /// Every open request seen so far, oldest first.
    pub fn requests(&self) -> Vec<OpenRequest> {
        self.requests.lock().clone()
    }

    /// Make the next `open` fail with `NotFound`.
    pub fn fail_next_open(&self) {
        *self.fail_next.lock() = true;
    }
}

impl PortOpener for MockPortOpener {
    fn open(
        &self,
        port_name: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        self.requests.lock().push(OpenRequest {
            port_name: port_name.to_string(),
            baud_rate: config.baud_rate,
        });

        let mut fail = self.fail_next.lock();
        if *fail {
            *fail = false;
            return Err(PortError::not_found(port_name));
        }

        let mut port = self.port.clone();
        port.set_timeout(config.timeout)?;
        Ok(Box::new(port))
    }
}

impl std::fmt::Debug for MockPortOpener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPortOpener")
            .field("port", &self.port)
            .field("requests", &self.requests.lock().len())
            .finish()
    }
}
