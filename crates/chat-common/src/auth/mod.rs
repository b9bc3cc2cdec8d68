//! Token capabilities
//!
//! The bearer token is never ambient state: it is held by a [`TokenProvider`]
//! passed explicitly to the HTTP client and the WebSocket session.

mod token;

pub use token::{InMemoryTokenStore, TokenProvider, TokenRefresher};
