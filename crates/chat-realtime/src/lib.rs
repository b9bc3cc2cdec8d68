//! # chat-realtime
//!
//! WebSocket session layer for the chat client.
//!
//! - [`ConnectionManager`] owns the single live transport, its lifecycle and
//!   the reconnect backoff.
//! - [`Session`] frames outgoing requests and dispatches inbound frames to
//!   subscribers by event or action name.
//! - [`SubscriptionRegistry`] is the name-keyed observer list both of them
//!   publish into.

pub mod connection;
pub mod error;
pub mod event;
pub mod registry;
pub mod session;
pub mod transport;

pub use connection::{Backoff, BackoffPolicy, ConnectionManager, ConnectionState, Endpoint};
pub use error::{ConnectionError, SessionError, SessionResult, TransportError};
pub use event::{SessionEvent, AUTH_ERROR, NET_ERROR};
pub use registry::{Subscription, SubscriptionRegistry};
pub use session::Session;
pub use transport::{Connector, Outbound, Transport, TransportEvent, TransportPeer, TungsteniteConnector};
