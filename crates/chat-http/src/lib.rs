//! # chat-http
//!
//! REST client for the chat backend.
//!
//! Every response body is an [`HttpEnvelope`](chat_protocol::HttpEnvelope).
//! Failures are classified into auth failures and plain application errors;
//! an expired token is refreshed and the request retried exactly once.

pub mod auth;
pub mod client;
pub mod error;

pub use auth::{challenge_error, classify};
pub use client::{ApiClient, ApiClientBuilder};
pub use error::{ApiError, ApiFailure, ApiResult};
