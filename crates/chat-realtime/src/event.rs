//! Events delivered to subscribers
//!
//! Inbound frames are published under their dispatch name. The session also
//! publishes two synthetic events of its own under [`NET_ERROR`] and
//! [`AUTH_ERROR`].

use chat_protocol::{AuthErrorKind, Frame, WsEvent, WsResponse};
use serde_json::{json, Value};

/// Published when a transport fails to open or errors out
pub const NET_ERROR: &str = "net_error";

/// Published once when the server closes the socket over bad credentials
pub const AUTH_ERROR: &str = "auth_error";

/// Payload handed to subscription callbacks
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A decoded inbound frame
    Frame(Frame),
    /// Transport-level failure
    NetError { detail: String },
    /// Terminal credential failure; the session will not reconnect
    AuthError(AuthErrorKind),
}

impl SessionEvent {
    /// Name this event is published under
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Frame(frame) => frame.dispatch_key(),
            Self::NetError { .. } => NET_ERROR,
            Self::AuthError(_) => AUTH_ERROR,
        }
    }

    #[must_use]
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Self::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    #[must_use]
    pub fn response(&self) -> Option<&WsResponse> {
        self.frame().and_then(Frame::as_response)
    }

    #[must_use]
    pub fn event(&self) -> Option<&WsEvent> {
        self.frame().and_then(Frame::as_event)
    }

    #[must_use]
    pub fn auth_error(&self) -> Option<AuthErrorKind> {
        match self {
            Self::AuthError(kind) => Some(*kind),
            _ => None,
        }
    }

    /// JSON view of the event
    ///
    /// Frames serialize as on the wire. Synthetic events carry an `error`
    /// field: `"ws_error"` for network failures, the close reason for auth
    /// failures.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Frame(frame) => serde_json::to_value(frame).unwrap_or(Value::Null),
            Self::NetError { detail } => json!({ "error": "ws_error", "detail": detail }),
            Self::AuthError(kind) => json!({ "error": kind.as_str() }),
        }
    }
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Frame(frame) => write!(f, "{frame}"),
            Self::NetError { detail } => write!(f, "net_error({detail})"),
            Self::AuthError(kind) => write!(f, "auth_error({kind})"),
        }
    }
}
