//! Configuration schema definitions.
//!
//! Mirrors the YAML file one-to-one. Every struct rejects unknown keys so a
//! typo fails the load instead of being silently dropped.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Default seconds between dirty-config saves.
pub const DEFAULT_SAVE_INTERVAL_SECS: u64 = 60;

/// Default baud rate of the encoder firmware.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default serial device name for the current platform.
#[cfg(target_os = "windows")]
pub const DEFAULT_SERIAL_PORT: &str = "COM4";

#[cfg(not(target_os = "windows"))]
pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyUSB0";

/// Root configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Named sliders. File order is tracked separately by the store.
    pub slider_mappings: HashMap<String, SliderMapping>,
    pub invert_sliders: bool,
    pub connection_info: ConnectionInfo,
    /// Opaque tag consumed by the audio backend.
    pub noise_reduction_level: String,
    /// Seconds between periodic saves. Zero is rejected.
    #[serde(deserialize_with = "non_zero_secs")]
    pub config_save_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            slider_mappings: HashMap::new(),
            invert_sliders: false,
            connection_info: ConnectionInfo::default(),
            noise_reduction_level: String::new(),
            config_save_interval: DEFAULT_SAVE_INTERVAL_SECS,
        }
    }
}

impl Config {
    /// Never shorter than one second, even for a hand-built config.
    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.config_save_interval.max(1))
    }
}

fn non_zero_secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let secs = u64::deserialize(deserializer)?;
    if secs == 0 {
        return Err(D::Error::custom("config_save_interval must be at least 1 second"));
    }
    Ok(secs)
}

/// One slider's state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SliderMapping {
    /// Volume in `[0.0, 1.0]`.
    #[serde(default)]
    pub volume: f32,
    #[serde(default)]
    pub muted: bool,
    /// Identifiers understood by the audio backend.
    #[serde(default)]
    pub targets: Vec<String>,
}

/// Serial connection parameters.
///
/// Defaults apply only when the whole `connection_info` section is missing;
/// a present section must spell out both fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionInfo {
    pub serial_port: String,
    pub baud_rate: u32,
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self {
            serial_port: DEFAULT_SERIAL_PORT.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}
