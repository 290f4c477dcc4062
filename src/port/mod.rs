//! Port abstraction layer for serial communication.
//!
//! Provides the adapter trait the session reads through, a real implementation
//! on top of `serialport`, and a mock for tests.

pub mod error;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockPortOpener, MockSerialPort, OpenRequest};
pub use sync_port::{available_ports, SyncSerialPort, SystemPortOpener};
pub use traits::*;
