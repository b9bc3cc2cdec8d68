//! Token storage and refresh capabilities

use async_trait::async_trait;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;

/// Source of the current bearer token
///
/// Implementations must be cheap to call: the HTTP client reads the token on
/// every request and the WebSocket session on every connect attempt.
pub trait TokenProvider: Send + Sync {
    /// Current token, or `None` when signed out. Never returns an empty string.
    fn get(&self) -> Option<String>;

    /// Replace the current token
    fn set(&self, token: &str);

    /// Forget the current token
    fn clear(&self);
}

/// Obtains a fresh token after the server reports expiry
///
/// Returning `None` (or an empty string) means the refresh failed and the
/// original failure should be surfaced to the caller.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self) -> Option<String>;
}

#[async_trait]
impl<F, Fut> TokenRefresher for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Option<String>> + Send,
{
    async fn refresh(&self) -> Option<String> {
        (self)().await
    }
}

/// Process-local token store
#[derive(Default)]
pub struct InMemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl InMemoryTokenStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `token`
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(&token.into());
        store
    }

    /// Create an empty store wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl TokenProvider for InMemoryTokenStore {
    fn get(&self) -> Option<String> {
        self.token.read().clone()
    }

    fn set(&self, token: &str) {
        *self.token.write() = Some(token.to_string()).filter(|t| !t.is_empty());
    }

    fn clear(&self) {
        *self.token.write() = None;
    }
}

impl std::fmt::Debug for InMemoryTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTokenStore")
            .field("has_token", &self.token.read().is_some())
            .finish()
    }
}
