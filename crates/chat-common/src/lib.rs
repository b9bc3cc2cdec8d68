//! # chat-common
//!
//! Shared client utilities including configuration, token capabilities, and telemetry.

pub mod auth;
pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{InMemoryTokenStore, TokenProvider, TokenRefresher};
pub use config::{ClientConfig, ConfigError, ReconnectConfig};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
