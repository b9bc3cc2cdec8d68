//! Authentication failure markers
//!
//! The server signals auth failures with the same two markers everywhere: as a
//! WebSocket close reason, as a `WWW-Authenticate` `error=` parameter, as a
//! numeric envelope status code, or as `data.error` in an envelope payload.

use serde::{Deserialize, Serialize};

/// Classified authentication failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    /// Token was valid but has expired; a refresh may recover
    TokenExpired,
    /// Token is malformed, revoked, or otherwise unacceptable
    InvalidToken,
}

impl AuthErrorKind {
    /// Envelope status code for an expired token
    pub const EXPIRED_STATUS_CODE: i64 = 4002;

    /// Envelope status code for an invalid token
    pub const INVALID_STATUS_CODE: i64 = 4003;

    /// Parse a textual marker (`token_expired` / `invalid_token`)
    #[must_use]
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "token_expired" => Some(Self::TokenExpired),
            "invalid_token" => Some(Self::InvalidToken),
            _ => None,
        }
    }

    /// Map an application-level envelope status code
    #[must_use]
    pub const fn from_status_code(code: i64) -> Option<Self> {
        match code {
            Self::EXPIRED_STATUS_CODE => Some(Self::TokenExpired),
            Self::INVALID_STATUS_CODE => Some(Self::InvalidToken),
            _ => None,
        }
    }

    /// The wire marker for this kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TokenExpired => "token_expired",
            Self::InvalidToken => "invalid_token",
        }
    }

    /// The envelope status code for this kind
    #[must_use]
    pub const fn status_code(self) -> i64 {
        match self {
            Self::TokenExpired => Self::EXPIRED_STATUS_CODE,
            Self::InvalidToken => Self::INVALID_STATUS_CODE,
        }
    }

    /// Whether a token refresh can recover from this failure
    #[must_use]
    pub const fn is_refreshable(self) -> bool {
        matches!(self, Self::TokenExpired)
    }
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
