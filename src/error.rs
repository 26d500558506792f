//! Error types for the duel session client.

use thiserror::Error;

/// Errors that can occur while synchronizing a game session.
///
/// None of these are fatal to a session: decode errors skip a single update,
/// command errors leave the state untouched, and transport errors end the
/// session through the regular close path.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An inbound frame or its payload is not a well-formed envelope.
    ///
    /// The reducer did not run and the session state is unchanged.
    #[error("protocol decode error: {reason}")]
    ProtocolDecode {
        /// What was wrong with the frame.
        reason: String,
    },

    /// A command was issued while the transport is not open.
    ///
    /// The command performed no state mutation and sent nothing.
    #[error("transport is not ready")]
    TransportNotReady,

    /// Failed to send a frame through the transport.
    #[error("transport send error: {0}")]
    TransportSend(String),

    /// Failed to receive a frame from the transport.
    #[error("transport receive error: {0}")]
    TransportReceive(String),

    /// The transport connection was closed.
    #[error("transport connection closed")]
    TransportClosed,

    /// Failed to serialize an outbound envelope.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An optimistic submission was never acknowledged by the server.
    #[error("submission not acknowledged after {attempts} attempt(s)")]
    SubmissionTimedOut {
        /// How many times the submission frame was sent.
        attempts: u32,
    },

    /// An operation timed out.
    #[error("operation timed out")]
    Timeout,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Build a [`SessionError::ProtocolDecode`] from anything printable.
    pub fn decode(reason: impl std::fmt::Display) -> Self {
        Self::ProtocolDecode {
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for errors that only skipped a single inbound update.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::ProtocolDecode { .. })
    }
}

/// A specialized [`Result`] type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
