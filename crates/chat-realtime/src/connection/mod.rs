//! Connection lifecycle
//!
//! Owns the live transport, reconnects after transient drops, and stops for
//! good after a deliberate close or an auth failure.

mod backoff;
mod endpoint;
mod manager;

pub use backoff::{Backoff, BackoffPolicy};
pub use endpoint::Endpoint;
pub use manager::{ConnectionManager, ConnectionState};
