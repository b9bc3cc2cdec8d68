//! Client configuration structs
//!
//! Loads configuration from environment variables or from the JSON
//! app-config document the web app serves alongside its assets.

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base URL prepended to every REST path, e.g. `https://chat.example.com/api`
    pub api_base_url: String,
    /// WebSocket endpoint, e.g. `wss://chat.example.com/ws`
    pub ws_url: String,
    #[serde(default)]
    pub release_tag: Option<String>,
    #[serde(default)]
    pub min_server_version: Option<String>,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Reconnection backoff settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl ReconnectConfig {
    #[must_use]
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

// Default value functions
fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl ClientConfig {
    /// Create a configuration with default reconnect and timeout settings
    #[must_use]
    pub fn new(api_base_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ws_url: ws_url.into(),
            release_tag: None,
            min_server_version: None,
            reconnect: ReconnectConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            api_base_url: lookup("CHAT_API_BASE_URL")
                .ok_or(ConfigError::MissingVar("CHAT_API_BASE_URL"))?,
            ws_url: lookup("CHAT_WS_URL").ok_or(ConfigError::MissingVar("CHAT_WS_URL"))?,
            release_tag: lookup("CHAT_RELEASE_TAG"),
            min_server_version: lookup("CHAT_MIN_SERVER_VERSION"),
            reconnect: ReconnectConfig {
                initial_backoff_ms: parse_var(&lookup, "CHAT_RECONNECT_INITIAL_MS")?
                    .unwrap_or_else(default_initial_backoff_ms),
                max_backoff_ms: parse_var(&lookup, "CHAT_RECONNECT_MAX_MS")?
                    .unwrap_or_else(default_max_backoff_ms),
            },
            request_timeout_secs: parse_var(&lookup, "CHAT_REQUEST_TIMEOUT_SECS")?
                .unwrap_or_else(default_request_timeout_secs),
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse the JSON app-config document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Download and parse the app-config document
    pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<Self, ConfigError> {
        let response = client
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await
            .map_err(|e| ConfigError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigError::Fetch(format!("{url} returned HTTP {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ConfigError::Fetch(e.to_string()))?;

        tracing::debug!(url = %url, "App config fetched");

        Self::from_json(&body)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconnect.initial_backoff_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "initial_backoff_ms",
                "must be greater than zero".to_string(),
            ));
        }
        if self.reconnect.max_backoff_ms < self.reconnect.initial_backoff_ms {
            return Err(ConfigError::InvalidValue(
                "max_backoff_ms",
                format!("must be at least {}", self.reconnect.initial_backoff_ms),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_var<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key, raw.clone()))
        })
        .transpose()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),

    #[error("Malformed app config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to fetch app config: {0}")]
    Fetch(String),
}
