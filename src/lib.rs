//! Rotary Mixer Library
//!
//! Turns a rotary encoder with a push button, attached over a serial port,
//! into per-application volume changes described by a YAML config file.
//!
//! # Modules
//!
//! - `config`: YAML config with ordered sliders, hot reload and periodic save
//! - `session`: Serial connection lifecycle and token interpretation
//! - `protocol`: Device line format
//! - `port`: Port abstraction layer for serial communication
//! - `fanout`: Ordered event delivery to subscribers
//! - `notifier`: User-facing notifications
//! - `task`: Stoppable background loops
//! - `error`: Unified error handling

pub mod config;
pub mod error;
pub mod fanout;
pub mod notifier;
pub mod port;
pub mod protocol;
pub mod session;
pub mod task;

// Re-export commonly used types for convenience
pub use config::{
    Config, ConfigError, ConfigManager, ConfigReloaded, ConfigResult, ConnectionInfo,
    SliderMapping,
};
pub use error::{AppError, AppResult};
pub use fanout::Broadcaster;
pub use notifier::{LogNotifier, Notifier};
pub use port::{
    MockPortOpener, MockSerialPort, PortConfiguration, PortError, PortOpener, SerialPortAdapter,
    SyncSerialPort, SystemPortOpener,
};
pub use protocol::Token;
pub use session::{Mode, SerialSession, SessionError, SessionResult, SliderMoveEvent};
pub use task::LoopHandle;
