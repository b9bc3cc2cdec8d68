//! Scripted connector for lifecycle tests

use super::{Connector, Transport, TransportPeer};
use crate::error::TransportError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;

pub(crate) struct MockConnector {
    attempts: Mutex<Vec<(Instant, String)>>,
    script: Mutex<VecDeque<bool>>,
    accept_by_default: bool,
    gate: Mutex<Option<Arc<Notify>>>,
    peers: mpsc::UnboundedSender<TransportPeer>,
}

impl MockConnector {
    /// Each accepted connect sends its peer end to the returned receiver
    pub(crate) fn new(
        accept_by_default: bool,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<TransportPeer>) {
        let (peers, peers_rx) = mpsc::unbounded_channel();
        let connector = Arc::new(Self {
            attempts: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            accept_by_default,
            gate: Mutex::new(None),
            peers,
        });
        (connector, peers_rx)
    }

    /// Queue outcomes for the next attempts (`true` accepts)
    pub(crate) fn script(&self, outcomes: &[bool]) {
        self.script.lock().extend(outcomes.iter().copied());
    }

    /// Stall the next handshake until the returned gate is notified
    pub(crate) fn hold_next(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn attempt_times(&self) -> Vec<Instant> {
        self.attempts.lock().iter().map(|(at, _)| *at).collect()
    }

    pub(crate) fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }

    pub(crate) fn urls(&self) -> Vec<String> {
        self.attempts.lock().iter().map(|(_, url)| url.clone()).collect()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &str) -> Result<Transport, TransportError> {
        self.attempts.lock().push((Instant::now(), url.to_string()));

        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let accept = self
            .script
            .lock()
            .pop_front()
            .unwrap_or(self.accept_by_default);
        if !accept {
            return Err(TransportError::Unavailable("connection refused".to_string()));
        }

        let (transport, peer) = Transport::channel();
        let _ = self.peers.send(peer);
        Ok(transport)
    }
}
