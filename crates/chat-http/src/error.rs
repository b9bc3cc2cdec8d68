//! HTTP client errors

use chat_protocol::{AuthErrorKind, HttpEnvelope};
use serde_json::Value;

/// An envelope that reported failure
#[derive(Debug, Clone, PartialEq)]
pub struct ApiFailure {
    /// HTTP status line code
    pub http_status: u16,
    /// Envelope `status_code`
    pub status_code: i64,
    pub message: String,
    /// Raw `data` payload of the failed envelope
    pub details: Option<Value>,
    pub auth_error: Option<AuthErrorKind>,
    pub request_id: Option<String>,
}

impl ApiFailure {
    /// Build from a failed envelope, classifying auth failures
    #[must_use]
    pub fn from_envelope(http_status: u16, challenge: Option<&str>, envelope: HttpEnvelope) -> Self {
        let auth_error = crate::auth::classify(
            http_status,
            challenge,
            envelope.status_code,
            envelope.embedded_error(),
        );
        Self {
            http_status,
            status_code: envelope.status_code,
            message: envelope.message,
            details: envelope.data,
            auth_error,
            request_id: envelope.request_id,
        }
    }
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = if self.message.is_empty() {
            "API error"
        } else {
            self.message.as_str()
        };
        write!(f, "{message} (status_code={}, http={})", self.status_code, self.http_status)?;
        if let Some(kind) = self.auth_error {
            write!(f, " [{kind}]")?;
        }
        Ok(())
    }
}

/// HTTP client error
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Response (HTTP {http_status}) is not a JSON envelope: {source}")]
    InvalidEnvelope {
        http_status: u16,
        #[source]
        source: serde_json::Error,
    },

    #[error("Response data does not match the expected type: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("{0}")]
    Failure(ApiFailure),
}

impl ApiError {
    #[must_use]
    pub fn failure(&self) -> Option<&ApiFailure> {
        match self {
            Self::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    /// Classified auth failure, if any
    #[must_use]
    pub fn auth_error(&self) -> Option<AuthErrorKind> {
        self.failure().and_then(|f| f.auth_error)
    }

    /// Envelope status code of a failed response
    #[must_use]
    pub fn status_code(&self) -> Option<i64> {
        self.failure().map(|f| f.status_code)
    }

    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        self.auth_error().is_some()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
