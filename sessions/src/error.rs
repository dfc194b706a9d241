//! Error types for session management.

use std::fmt;

use crate::SessionId;

/// Result type for session management.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised by the session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session never existed, expired or was terminated.
    UnknownSession { id: SessionId },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSession { id } => write!(f, "unknown session {id}"),
        }
    }
}

impl std::error::Error for SessionError {}
