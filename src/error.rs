use crate::config::ConfigError;
use crate::port::PortError;
use crate::session::SessionError;
use thiserror::Error;

/// A specialized `Result` type for application entry points.
pub type AppResult<T> = Result<T, AppError>;

/// Unified application error type.
///
/// Library components return their own error types; this wraps them for
/// the binary and for embedders that drive the whole pipeline.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("serial session error: {0}")]
    Session(#[from] SessionError),

    #[error("serial port error: {0}")]
    Port(#[from] PortError),

    #[error("runtime error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Whether retrying later could succeed without user intervention.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Port(e) => e.is_transient(),
            Self::Session(SessionError::Port(e)) => e.is_transient(),
            _ => false,
        }
    }
}
