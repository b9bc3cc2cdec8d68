//! Envelope-aware HTTP client
//!
//! Each call runs a two-state machine: the first attempt may refresh an
//! expired token and go again, the retried attempt surfaces whatever it gets.

use crate::error::{ApiError, ApiFailure, ApiResult};
use chat_common::{TokenProvider, TokenRefresher};
use chat_protocol::{AuthErrorKind, HttpEnvelope};
use reqwest::header::{CONTENT_TYPE, WWW_AUTHENTICATE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Position of a call in its retry budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retried,
}

/// Builder for [`ApiClient`]
pub struct ApiClientBuilder {
    base_url: String,
    tokens: Option<Arc<dyn TokenProvider>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
    timeout: Option<Duration>,
    http: Option<reqwest::Client>,
}

impl ApiClientBuilder {
    /// Start a builder for `base_url`; request paths are appended verbatim
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            tokens: None,
            refresher: None,
            timeout: None,
            http: None,
        }
    }

    /// Read the bearer token from `tokens` on every request
    #[must_use]
    pub fn token_provider(mut self, tokens: Arc<dyn TokenProvider>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Called once per request when the server reports an expired token
    #[must_use]
    pub fn refresher(mut self, refresher: impl TokenRefresher + 'static) -> Self {
        self.refresher = Some(Arc::new(refresher));
        self
    }

    #[must_use]
    pub fn shared_refresher(mut self, refresher: Arc<dyn TokenRefresher>) -> Self {
        self.refresher = Some(refresher);
        self
    }

    /// Per-request timeout (ignored when a custom client is supplied)
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a preconfigured `reqwest` client
    #[must_use]
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    pub fn build(self) -> ApiResult<ApiClient> {
        let http = match self.http {
            Some(http) => http,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = self.timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(ApiClient {
            http,
            base_url: self.base_url,
            tokens: self.tokens,
            refresher: self.refresher,
        })
    }
}

/// HTTP client that unwraps response envelopes
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    tokens: Option<Arc<dyn TokenProvider>>,
    refresher: Option<Arc<dyn TokenRefresher>>,
}

/// What one round trip produced
struct Exchange {
    http_status: u16,
    challenge: Option<String>,
    envelope: HttpEnvelope,
}

impl ApiClient {
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder::new(base_url)
    }

    pub async fn get<T>(&self, path: &str) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        self.execute(Method::GET, path, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_string(body).map_err(ApiError::Encode)?;
        self.execute(Method::POST, path, Some(body)).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_string(body).map_err(ApiError::Encode)?;
        self.execute(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_string(body).map_err(ApiError::Encode)?;
        self.execute(Method::PATCH, path, Some(body)).await
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue `method path` and unwrap the envelope
    ///
    /// The identical method, path and body are reused for the retry; only the
    /// bearer token changes.
    async fn execute<T>(&self, method: Method, path: &str, body: Option<String>) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.base_url);
        let mut token = self.tokens.as_ref().and_then(|t| t.get());
        let mut attempt = Attempt::First;

        loop {
            let exchange = self
                .exchange(&method, &url, body.as_deref(), token.as_deref())
                .await?;

            if exchange.envelope.is_success() {
                return decode_data(exchange.envelope.data);
            }

            let failure = ApiFailure::from_envelope(
                exchange.http_status,
                exchange.challenge.as_deref(),
                exchange.envelope,
            );

            if attempt == Attempt::First && failure.auth_error == Some(AuthErrorKind::TokenExpired) {
                if let Some(fresh) = self.refresh().await {
                    tracing::info!(method = %method, path = %path, "Token refreshed; retrying request");
                    token = Some(fresh);
                    attempt = Attempt::Retried;
                    continue;
                }
            }

            tracing::debug!(
                method = %method,
                path = %path,
                http_status = failure.http_status,
                status_code = failure.status_code,
                auth_error = ?failure.auth_error,
                retried = attempt == Attempt::Retried,
                "Request failed"
            );
            return Err(ApiError::Failure(failure));
        }
    }

    async fn exchange(
        &self,
        method: &Method,
        url: &str,
        body: Option<&str>,
        token: Option<&str>,
    ) -> ApiResult<Exchange> {
        let mut request = self
            .http
            .request(method.clone(), url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request.send().await?;
        let http_status = response.status().as_u16();
        let challenge = response
            .headers()
            .get(WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?;

        let envelope = HttpEnvelope::from_slice(&bytes)
            .map_err(|source| ApiError::InvalidEnvelope { http_status, source })?;

        Ok(Exchange {
            http_status,
            challenge,
            envelope,
        })
    }

    /// Obtain a fresh token and store it
    ///
    /// `None` when no refresher is configured or the refresh failed.
    async fn refresh(&self) -> Option<String> {
        let refresher = self.refresher.as_ref()?;

        match refresher.refresh().await.filter(|t| !t.is_empty()) {
            Some(token) => {
                if let Some(tokens) = &self.tokens {
                    tokens.set(&token);
                }
                Some(token)
            }
            None => {
                tracing::warn!("Token refresh failed; surfacing original failure");
                None
            }
        }
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.tokens.is_some())
            .field("refresh", &self.refresher.is_some())
            .finish_non_exhaustive()
    }
}

/// Decode the payload of a successful envelope
///
/// Absent `data` decodes as `{}`, or as `null` for types that reject a map
/// (such as `()`).
fn decode_data<T>(data: Option<Value>) -> ApiResult<T>
where
    T: DeserializeOwned,
{
    match data {
        Some(value) => serde_json::from_value(value).map_err(ApiError::Decode),
        None => serde_json::from_value(Value::Object(Map::new()))
            .or_else(|_| serde_json::from_value(Value::Null))
            .map_err(ApiError::Decode),
    }
}
