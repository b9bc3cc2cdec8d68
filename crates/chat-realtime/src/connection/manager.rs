//! Connection manager
//!
//! Holds at most one live transport. Transient drops schedule a reconnect
//! with exponential backoff; a deliberate [`ConnectionManager::close`] or an
//! auth close stops reconnecting until the caller connects again.
//!
//! Lifecycle state lives behind one `parking_lot` mutex. Subscriber
//! callbacks are always invoked after the lock is released.

use super::{Backoff, BackoffPolicy, Endpoint};
use crate::error::ConnectionError;
use crate::event::{SessionEvent, AUTH_ERROR, NET_ERROR};
use crate::registry::SubscriptionRegistry;
use crate::transport::{Connector, Outbound, TransportEvent};
use chat_protocol::CloseReason;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Connection lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport and no reconnect pending
    Idle,
    /// A connect attempt is in flight
    Connecting,
    /// Transport is open
    Open,
    /// Waiting out the backoff before the next attempt
    Reconnecting,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Reconnecting => "reconnecting",
        };
        f.write_str(s)
    }
}

type TextHandler = Arc<dyn Fn(&str) + Send + Sync>;

struct LinkState {
    lifecycle: ConnectionState,
    outbound: Option<mpsc::UnboundedSender<Outbound>>,
    backoff: Backoff,
    /// Set by `close()` and by auth closes; cleared by `connect()`
    manual_close: bool,
    /// Bumped by `connect()` and by every successful open so a superseded
    /// reader's close is ignored
    generation: u64,
    reconnect_task: Option<JoinHandle<()>>,
    reconnect_attempt: u32,
}

struct Inner {
    endpoint: Endpoint,
    connector: Arc<dyn Connector>,
    registry: SubscriptionRegistry,
    on_text: TextHandler,
    link: Mutex<LinkState>,
}

/// Owns the WebSocket lifecycle
///
/// Dropping the manager closes the connection and cancels any pending
/// reconnect.
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Create a manager
    ///
    /// `on_text` receives every inbound text frame. Synthetic `net_error` and
    /// `auth_error` events are published to `registry`.
    pub fn new<H>(
        endpoint: Endpoint,
        connector: Arc<dyn Connector>,
        policy: BackoffPolicy,
        registry: SubscriptionRegistry,
        on_text: H,
    ) -> Self
    where
        H: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                endpoint,
                connector,
                registry,
                on_text: Arc::new(on_text),
                link: Mutex::new(LinkState {
                    lifecycle: ConnectionState::Idle,
                    outbound: None,
                    backoff: Backoff::new(policy),
                    manual_close: false,
                    generation: 0,
                    reconnect_task: None,
                    reconnect_attempt: 0,
                }),
            }),
        }
    }

    /// Open the transport
    ///
    /// Clears a previous deliberate close. If a reconnect is pending its timer
    /// is cancelled and the attempt happens now. A failure here publishes
    /// `net_error` and is not retried automatically.
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        {
            let mut link = self.inner.link.lock();
            match link.lifecycle {
                ConnectionState::Connecting | ConnectionState::Open => {
                    return Err(ConnectionError::AlreadyConnected);
                }
                ConnectionState::Idle | ConnectionState::Reconnecting => {}
            }
            if let Some(task) = link.reconnect_task.take() {
                task.abort();
            }
            link.manual_close = false;
            // a close still in flight from the previous transport is stale now
            link.generation += 1;
            link.lifecycle = ConnectionState::Connecting;
        }

        self.inner.open(ConnectionState::Idle).await
    }

    /// Queue a text frame on the open transport
    ///
    /// Returns `false` and drops the frame when no transport is open.
    pub fn send(&self, text: String) -> bool {
        let link = self.inner.link.lock();
        match (&link.lifecycle, &link.outbound) {
            (ConnectionState::Open, Some(outbound)) => outbound.send(Outbound::Text(text)).is_ok(),
            _ => {
                tracing::debug!(state = %link.lifecycle, "Dropping outbound frame; connection not open");
                false
            }
        }
    }

    /// Close deliberately; no reconnect follows
    pub fn close(&self) {
        self.inner.shutdown();
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.inner.link.lock().lifecycle
    }

    /// Delay the next reconnect attempt would wait
    #[must_use]
    pub fn current_backoff(&self) -> Duration {
        self.inner.link.lock().backoff.current()
    }

    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let link = self.inner.link.lock();
        f.debug_struct("ConnectionManager")
            .field("endpoint", &self.inner.endpoint)
            .field("state", &link.lifecycle)
            .field("backoff", &link.backoff.current())
            .finish_non_exhaustive()
    }
}

impl Inner {
    /// Run one connect attempt; the caller has already set `Connecting`
    ///
    /// On failure the state falls back to `on_failure` unless something else
    /// changed it in the meantime.
    async fn open(self: &Arc<Self>, on_failure: ConnectionState) -> Result<(), ConnectionError> {
        let url = self.endpoint.url();
        tracing::debug!(url = %self.endpoint.base_url(), "Opening WebSocket");

        let transport = match self.connector.connect(&url).await {
            Ok(transport) => transport,
            Err(e) => {
                {
                    let mut link = self.link.lock();
                    if link.lifecycle == ConnectionState::Connecting {
                        link.lifecycle = on_failure;
                    }
                }
                tracing::warn!(error = %e, "WebSocket connect failed");
                self.registry.emit(
                    NET_ERROR,
                    &SessionEvent::NetError {
                        detail: e.to_string(),
                    },
                );
                return Err(e.into());
            }
        };

        let generation = {
            let mut link = self.link.lock();
            if link.manual_close || link.lifecycle != ConnectionState::Connecting {
                // close() ran during the handshake
                if transport.outbound.send(Outbound::Close).is_err() {
                    tracing::trace!("Transport pump already gone");
                }
                return Err(ConnectionError::Closed);
            }
            link.generation += 1;
            link.outbound = Some(transport.outbound);
            link.lifecycle = ConnectionState::Open;
            link.backoff.reset();
            link.reconnect_attempt = 0;
            link.reconnect_task = None;
            link.generation
        };

        tracing::info!(url = %self.endpoint.base_url(), generation, "WebSocket open");
        tokio::spawn(Arc::clone(self).read_loop(generation, transport.inbound));
        Ok(())
    }

    async fn read_loop(
        self: Arc<Self>,
        generation: u64,
        mut inbound: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        while let Some(event) = inbound.recv().await {
            match event {
                TransportEvent::Message(text) => (self.on_text)(&text),
                TransportEvent::Closed { reason } => {
                    self.handle_close(generation, &CloseReason::parse(reason.as_deref()));
                    return;
                }
            }
        }
        self.handle_close(generation, &CloseReason::Transient(None));
    }

    fn handle_close(self: &Arc<Self>, generation: u64, reason: &CloseReason) {
        let mut link = self.link.lock();
        if link.generation != generation {
            tracing::trace!(generation, "Ignoring close of superseded transport");
            return;
        }
        link.outbound = None;

        if let Some(kind) = reason.auth_error() {
            link.manual_close = true;
            link.lifecycle = ConnectionState::Idle;
            drop(link);

            tracing::warn!(reason = %kind, "WebSocket closed for auth failure; not reconnecting");
            self.registry.emit(AUTH_ERROR, &SessionEvent::AuthError(kind));
            return;
        }

        if link.manual_close {
            link.lifecycle = ConnectionState::Idle;
            tracing::debug!("WebSocket closed");
            return;
        }

        tracing::info!(reason = %reason, "WebSocket lost; reconnecting");
        link.lifecycle = ConnectionState::Reconnecting;
        link.reconnect_task = Some(tokio::spawn(Arc::clone(self).reconnect_loop()));
    }

    async fn reconnect_loop(self: Arc<Self>) {
        loop {
            let (delay, attempt) = {
                let mut link = self.link.lock();
                if link.manual_close || link.lifecycle != ConnectionState::Reconnecting {
                    return;
                }
                link.reconnect_attempt += 1;
                (link.backoff.next_delay(), link.reconnect_attempt)
            };

            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Reconnect scheduled");
            tokio::time::sleep(delay).await;

            {
                let mut link = self.link.lock();
                if link.manual_close || link.lifecycle != ConnectionState::Reconnecting {
                    return;
                }
                link.lifecycle = ConnectionState::Connecting;
            }

            match self.open(ConnectionState::Reconnecting).await {
                Ok(()) | Err(ConnectionError::Closed) => return,
                Err(e) => tracing::debug!(attempt, error = %e, "Reconnect attempt failed"),
            }
        }
    }

    fn shutdown(&self) {
        let mut link = self.link.lock();
        link.manual_close = true;
        link.lifecycle = ConnectionState::Idle;
        if let Some(task) = link.reconnect_task.take() {
            task.abort();
        }
        if let Some(outbound) = link.outbound.take() {
            if outbound.send(Outbound::Close).is_err() {
                tracing::trace!("Transport pump already gone");
            }
            tracing::debug!(url = %self.endpoint.base_url(), "WebSocket close requested");
        }
    }
}
