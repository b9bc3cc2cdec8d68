//! Integration test utilities for the chat client
//!
//! Provides an in-process HTTP backend with scripted envelope replies and a
//! WebSocket peer the tests drive frame by frame.

pub mod backend;
pub mod ws_peer;

pub use backend::{MockBackend, RecordedRequest, Reply};
pub use ws_peer::{MockWsServer, PeerConnection};

/// Install a test subscriber once; later calls are no-ops
pub fn init_test_tracing() {
    let _ = chat_common::try_init_tracing_with_config(chat_common::TracingConfig::development());
}
