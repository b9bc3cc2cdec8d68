//! HTTP response envelope
//!
//! Every REST response body wraps its payload in the same envelope. A
//! `status_code` of zero is success regardless of the HTTP status line.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope status code denoting success
pub const STATUS_OK: i64 = 0;

/// REST response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpEnvelope<T = Value> {
    /// Server protocol version
    #[serde(default)]
    pub version: String,

    /// Application status code (0 = success)
    pub status_code: i64,

    /// Human-readable status message
    #[serde(default)]
    pub message: String,

    /// Payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Server-side request identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl<T> HttpEnvelope<T> {
    /// Create a success envelope
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            version: "1".to_string(),
            status_code: STATUS_OK,
            message: "ok".to_string(),
            data: Some(data),
            request_id: None,
        }
    }

    /// Create a failure envelope
    #[must_use]
    pub fn failure(status_code: i64, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            version: "1".to_string(),
            status_code,
            message: message.into(),
            data,
            request_id: None,
        }
    }

    /// Check if the envelope reports success
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status_code == STATUS_OK
    }
}

impl HttpEnvelope<Value> {
    /// The `error` string embedded in the payload, if present
    #[must_use]
    pub fn embedded_error(&self) -> Option<&str> {
        self.data.as_ref()?.get("error")?.as_str()
    }

    /// Deserialize from JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
