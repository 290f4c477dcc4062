//! Configuration for rotary-mixer.
//!
//! The config lives in a single YAML file describing the sliders the encoder
//! can drive, in the order channel selection walks them, plus the serial
//! connection to use.
//!
//! # Configuration Resolution
//!
//! The file path is picked in this order:
//!
//! 1. `--config` on the command line
//! 2. `ROTARY_MIXER_CONFIG` environment variable
//! 3. `./config.yaml` if it exists
//! 4. `~/.config/rotary-mixer/config.yaml` (XDG on Linux/macOS)
//!    or `%APPDATA%\rotary-mixer\config\config.yaml` (Windows)
//!
//! # Example
//!
//! ```yaml
//! slider_mappings:
//!   master:
//!     volume: 0.5
//!     targets: [master]
//!   game:
//!     volume: 0.8
//!     muted: false
//!     targets: [game.exe]
//! connection_info:
//!   serial_port: COM4
//!   baud_rate: 9600
//! config_save_interval: 60
//! ```
//!
//! `ConfigManager` keeps the file in memory, saves it periodically when the
//! encoder has changed a volume, and reloads it when it is edited on disk.

mod error;
mod loader;
mod manager;
mod schema;
mod store;
mod watcher;

pub use error::{ConfigError, ConfigResult};
pub use loader::{default_config_path, resolve_config_path, CONFIG_FILE_NAME, CONFIG_PATH_ENV};
pub use manager::{ConfigManager, ConfigReloaded};
pub use schema::{
    Config, ConnectionInfo, SliderMapping, DEFAULT_BAUD_RATE, DEFAULT_SAVE_INTERVAL_SECS,
    DEFAULT_SERIAL_PORT,
};
pub use store::ConfigStore;
pub use watcher::{ReloadDebouncer, DELAY_AFTER_CHANGE, MIN_TIME_BETWEEN_RELOADS};
