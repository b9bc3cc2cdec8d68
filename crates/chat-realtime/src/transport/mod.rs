//! Transport abstraction
//!
//! A [`Connector`] opens one socket and hands back a [`Transport`]: a pair of
//! channels pumped by background tasks. The connection manager never touches
//! the socket itself, which keeps it testable without a network.

mod websocket;

#[cfg(test)]
pub(crate) mod mock;

pub use websocket::TungsteniteConnector;

use crate::error::TransportError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Something the socket reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame
    Message(String),
    /// The socket closed; `reason` is the peer's close reason, if any
    Closed { reason: Option<String> },
}

/// Something to write to the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    /// Send a close frame and stop writing
    Close,
}

/// Client side of an open socket
#[derive(Debug)]
pub struct Transport {
    pub outbound: mpsc::UnboundedSender<Outbound>,
    pub inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Socket side of a [`Transport`], held by the pump tasks
#[derive(Debug)]
pub struct TransportPeer {
    pub outbound: mpsc::UnboundedReceiver<Outbound>,
    pub inbound: mpsc::UnboundedSender<TransportEvent>,
}

impl Transport {
    /// Create a linked transport and peer
    #[must_use]
    pub fn channel() -> (Self, TransportPeer) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        (
            Self {
                outbound: outbound_tx,
                inbound: inbound_rx,
            },
            TransportPeer {
                outbound: outbound_rx,
                inbound: inbound_tx,
            },
        )
    }
}

/// Opens transports
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a socket to `url`
    ///
    /// Resolves once the handshake completes, i.e. when the socket is open.
    async fn connect(&self, url: &str) -> Result<Transport, TransportError>;
}
