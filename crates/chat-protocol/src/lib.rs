//! # chat-protocol
//!
//! Wire format shared by the HTTP and WebSocket clients.
//!
//! Everything here is plain data: frame and envelope types, the auth failure
//! markers the server uses, and close-reason classification. No I/O.

mod auth;
mod close_reason;
mod envelope;
mod frame;

pub use auth::AuthErrorKind;
pub use close_reason::CloseReason;
pub use envelope::{HttpEnvelope, STATUS_OK};
pub use frame::{Frame, WsEvent, WsRequest, WsResponse, FALLBACK_DISPATCH_KEY, PROTOCOL_VERSION};
