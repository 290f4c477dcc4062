//! Configuration error types for the config module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found at expected path
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Failed to read config file
    #[error("Failed to read configuration file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML or content that violates the schema
    #[error("Failed to decode configuration: {0}")]
    Decode(#[source] serde_yaml::Error),

    /// Failed to serialize config
    #[error("Failed to encode configuration: {0}")]
    Encode(#[source] serde_yaml::Error),

    /// Failed to open or write the config file
    #[error("Failed to write configuration file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No slider with this name
    #[error("Slider mapping with key '{0}' not found")]
    SliderNotFound(String),

    /// No sliders configured at all
    #[error("No slider mappings available")]
    NoSliders,

    /// Index outside the ordered key sequence
    #[error("Slider index {index} is out of range (have {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// File watcher could not be set up
    #[error("Config watcher error: {0}")]
    Watch(#[from] notify::Error),
}

impl ConfigError {
    /// Missing file, unknown slider key or empty slider set.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::SliderNotFound(_) | Self::NoSliders
        )
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Write { .. } | Self::Encode(_))
    }

    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::IndexOutOfRange { .. })
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
