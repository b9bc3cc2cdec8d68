//! WebSocket endpoint with bearer token query parameter

use chat_common::TokenProvider;
use std::sync::Arc;

/// Where to connect, and which token to present
///
/// The URL is rebuilt on every connect attempt so a token refreshed between
/// reconnects is picked up.
#[derive(Clone)]
pub struct Endpoint {
    base_url: String,
    tokens: Option<Arc<dyn TokenProvider>>,
}

impl Endpoint {
    /// Endpoint without credentials
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            tokens: None,
        }
    }

    /// Endpoint that appends `token=<current token>` to the URL
    #[must_use]
    pub fn with_tokens(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            base_url: base_url.into(),
            tokens: Some(tokens),
        }
    }

    /// URL for the next connect attempt
    ///
    /// A signed-out provider still yields an empty `token=` parameter; the
    /// server rejects it with an auth close.
    #[must_use]
    pub fn url(&self) -> String {
        let Some(tokens) = &self.tokens else {
            return self.base_url.clone();
        };

        let token = tokens.get().unwrap_or_default();
        let encoded: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
        let separator = if self.base_url.contains('?') { '&' } else { '?' };

        format!("{}{separator}token={encoded}", self.base_url)
    }

    /// URL without credentials, safe to log
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.tokens.is_some())
            .finish()
    }
}
