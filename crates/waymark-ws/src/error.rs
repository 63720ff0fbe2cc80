//! WebSocket error types.

use std::fmt;

use thiserror::Error;

/// Result type for WebSocket operations.
pub type WsResult<T> = Result<T, WsError>;

/// Errors raised during the handshake or on an established connection.
#[derive(Debug, Error)]
pub enum WsError {
    /// The request is not a usable upgrade request.
    #[error("invalid WebSocket handshake: {0}")]
    Handshake(String),

    /// The transport could not be taken over from the HTTP connection.
    #[error("connection upgrade failed: {0}")]
    Upgrade(#[from] hyper::Error),

    /// The peer closed the connection, or it was closed locally.
    #[error("connection closed: {reason}")]
    Closed {
        /// Close code, if one was exchanged.
        code: Option<u16>,
        /// Close reason.
        reason: String,
    },

    /// A message payload was not valid JSON for the requested type.
    #[error("invalid JSON message: {0}")]
    Json(#[from] serde_json::Error),

    /// A message of the wrong kind was received.
    #[error("unexpected message: expected {expected}, got {actual}")]
    UnexpectedMessage {
        /// Message kind the caller asked for.
        expected: &'static str,
        /// Message kind that arrived.
        actual: &'static str,
    },

    /// WebSocket protocol failure.
    #[error("protocol error: {0}")]
    Protocol(#[from] tungstenite::Error),
}

impl WsError {
    /// Creates a handshake error.
    pub fn handshake(reason: impl Into<String>) -> Self {
        Self::Handshake(reason.into())
    }

    /// Creates a closed-connection error.
    pub fn closed(code: Option<u16>, reason: impl Into<String>) -> Self {
        Self::Closed {
            code,
            reason: reason.into(),
        }
    }

    /// Returns the close code carried by a closed-connection error.
    pub fn close_code(&self) -> Option<u16> {
        match self {
            Self::Closed { code, .. } => *code,
            _ => None,
        }
    }

    /// Returns `true` if the connection cannot be used any more.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Json(_) | Self::UnexpectedMessage { .. })
    }
}

/// Standard close codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum CloseCode {
    /// Normal closure (1000).
    Normal = 1000,
    /// Endpoint going away (1001).
    GoingAway = 1001,
    /// Protocol error (1002).
    Protocol = 1002,
    /// Unsupported data (1003).
    Unsupported = 1003,
    /// Invalid payload data (1007).
    InvalidPayload = 1007,
    /// Policy violation (1008).
    PolicyViolation = 1008,
    /// Message too big (1009).
    MessageTooBig = 1009,
    /// Internal server error (1011).
    InternalError = 1011,
}

impl CloseCode {
    const ALL: [Self; 8] = [
        Self::Normal,
        Self::GoingAway,
        Self::Protocol,
        Self::Unsupported,
        Self::InvalidPayload,
        Self::PolicyViolation,
        Self::MessageTooBig,
        Self::InternalError,
    ];

    /// Looks up a known close code.
    pub fn from_u16(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|known| known.as_u16() == code)
    }

    /// Returns the numeric code.
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for CloseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, self.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_error() {
        let err = WsError::closed(Some(1000), "bye");
        assert_eq!(err.close_code(), Some(1000));
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "connection closed: bye");
    }

    #[test]
    fn test_recoverable_errors() {
        let err = WsError::UnexpectedMessage {
            expected: "text",
            actual: "binary",
        };
        assert!(!err.is_fatal());
        assert!(WsError::handshake("missing key").is_fatal());
    }

    #[test]
    fn test_close_code_lookup() {
        assert_eq!(CloseCode::from_u16(1000), Some(CloseCode::Normal));
        assert_eq!(CloseCode::from_u16(1011), Some(CloseCode::InternalError));
        assert_eq!(CloseCode::from_u16(4000), None);
        assert_eq!(CloseCode::GoingAway.to_string(), "GoingAway (1001)");
    }
}
