//! Error types for the WebSocket session

use std::time::Duration;

/// Failure to establish a transport
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket handshake failed: {0}")]
    Handshake(#[source] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Handshake(Box::new(err))
    }
}

/// Connection lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Connection is already open or opening")]
    AlreadyConnected,

    #[error("Connection was closed while opening")]
    Closed,
}

/// Errors surfaced by [`crate::Session`]
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("Failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Frame not sent: connection is not open")]
    NotSent,

    #[error("No response to {action} within {timeout:?}")]
    Timeout { action: String, timeout: Duration },
}

pub type SessionResult<T> = Result<T, SessionError>;
