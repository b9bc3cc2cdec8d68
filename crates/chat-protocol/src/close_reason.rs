//! WebSocket close reasons
//!
//! The server closes a socket with a textual reason. Two reasons are terminal
//! auth failures; anything else (including no reason at all) is a transient
//! disconnect the client may recover from by reconnecting.

use crate::AuthErrorKind;

/// Classified reason attached to a WebSocket close
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer rejected the session's credentials
    Auth(AuthErrorKind),
    /// Any other close, with the raw reason if one was given
    Transient(Option<String>),
}

impl CloseReason {
    /// Classify a raw close reason
    #[must_use]
    pub fn parse(reason: Option<&str>) -> Self {
        match reason {
            Some(raw) => AuthErrorKind::from_marker(raw).map_or_else(
                || Self::Transient(Some(raw.to_string()).filter(|r| !r.is_empty())),
                Self::Auth,
            ),
            None => Self::Transient(None),
        }
    }

    /// Check if the client should attempt to reconnect after this close
    #[must_use]
    pub const fn should_reconnect(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Auth failure carried by this close, if any
    #[must_use]
    pub const fn auth_error(&self) -> Option<AuthErrorKind> {
        match self {
            Self::Auth(kind) => Some(*kind),
            Self::Transient(_) => None,
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth(kind) => write!(f, "auth failure ({kind})"),
            Self::Transient(Some(reason)) => write!(f, "transient ({reason})"),
            Self::Transient(None) => write!(f, "transient"),
        }
    }
}
