//! # chat-sdk
//!
//! One-stop entry point for the chat client: an [`ApiClient`] and a
//! [`Session`] factory sharing a single token store.
//!
//! ```no_run
//! use chat_sdk::{ClientConfig, InMemoryTokenStore, Sdk};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let sdk = Sdk::new(config, InMemoryTokenStore::new_shared())?;
//!
//! let session = sdk.session();
//! session.on("new_message", |event| println!("{}", event.to_value()));
//! session.connect().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

pub use chat_common::{
    ClientConfig, ConfigError, InMemoryTokenStore, TokenProvider, TokenRefresher,
};
pub use chat_http::{ApiClient, ApiError, ApiFailure, ApiResult};
pub use chat_protocol::{AuthErrorKind, Frame, HttpEnvelope, WsEvent, WsResponse};
pub use chat_realtime::{
    ConnectionState, Session, SessionError, SessionEvent, Subscription, AUTH_ERROR, NET_ERROR,
};

/// SDK construction errors
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Client facade
pub struct Sdk {
    config: ClientConfig,
    tokens: Arc<dyn TokenProvider>,
    api: ApiClient,
}

impl Sdk {
    /// Build the SDK without token refresh
    pub fn new(config: ClientConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, SdkError> {
        Self::build(config, tokens, None)
    }

    /// Build the SDK; expired tokens on REST calls are refreshed through `refresher`
    pub fn with_refresher(
        config: ClientConfig,
        tokens: Arc<dyn TokenProvider>,
        refresher: Arc<dyn TokenRefresher>,
    ) -> Result<Self, SdkError> {
        Self::build(config, tokens, Some(refresher))
    }

    /// Build from environment configuration with an empty in-memory token store
    pub fn from_env() -> Result<Self, SdkError> {
        Self::new(ClientConfig::from_env()?, InMemoryTokenStore::new_shared())
    }

    fn build(
        config: ClientConfig,
        tokens: Arc<dyn TokenProvider>,
        refresher: Option<Arc<dyn TokenRefresher>>,
    ) -> Result<Self, SdkError> {
        let mut builder = ApiClient::builder(&config.api_base_url)
            .token_provider(Arc::clone(&tokens))
            .timeout(config.request_timeout());
        if let Some(refresher) = refresher {
            builder = builder.shared_refresher(refresher);
        }
        let api = builder.build()?;

        tracing::debug!(
            api_base_url = %config.api_base_url,
            ws_url = %config.ws_url,
            release = ?config.release_tag,
            "SDK initialized"
        );

        Ok(Self {
            config,
            tokens,
            api,
        })
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Create a new, unconnected WebSocket session
    ///
    /// Each call returns an independent session; the token is read from the
    /// shared store at every connect attempt.
    #[must_use]
    pub fn session(&self) -> Session {
        Session::from_config(&self.config, Some(Arc::clone(&self.tokens)))
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenProvider> {
        &self.tokens
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl std::fmt::Debug for Sdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sdk")
            .field("api", &self.api)
            .field("ws_url", &self.config.ws_url)
            .finish_non_exhaustive()
    }
}
