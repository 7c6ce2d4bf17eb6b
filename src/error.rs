//! Error types for the client engine.
//!
//! The engine distinguishes ordinary transport failures, which are surfaced
//! to the immediate caller of the operation that failed, from the terminal
//! [`EngineError::ConnectionLost`], which is raised only by the
//! keepalive-aware read path and means the connection object must be
//! abandoned and re-established from scratch.

use thiserror::Error;

/// Convenience type alias for Results using [`EngineError`].
pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Top-level engine errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// I/O error during connecting, reading, or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection to the server is dead. Reconnection requires a fresh
    /// connect/logon; retrying operations on the same connection is futile.
    #[error("connection lost: {reason}")]
    ConnectionLost {
        /// Human-readable description of what went wrong.
        reason: &'static str,
        /// The underlying I/O error, when one triggered the loss.
        #[source]
        source: Option<std::io::Error>,
    },

    /// The configured host is not a valid TLS server name.
    #[error("invalid server name: {0}")]
    BadServerName(String),
}

impl EngineError {
    /// Builds a [`EngineError::ConnectionLost`] with an optional cause.
    pub fn connection_lost(reason: &'static str, source: Option<std::io::Error>) -> Self {
        EngineError::ConnectionLost { reason, source }
    }

    /// Returns `true` if this error means the connection must be abandoned.
    pub fn is_connection_lost(&self) -> bool {
        matches!(self, EngineError::ConnectionLost { .. })
    }
}
