//! Serial session error types.

use crate::port::PortError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// `start` was called while a connection is open.
    #[error("serial: connection already active")]
    AlreadyActive,

    /// The device could not be opened or the reader could not be started.
    #[error("open serial connection: {0}")]
    Port(#[from] PortError),
}

impl SessionError {
    pub fn is_already_active(&self) -> bool {
        matches!(self, Self::AlreadyActive)
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
