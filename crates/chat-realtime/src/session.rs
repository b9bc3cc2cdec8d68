//! Protocol session
//!
//! Frames outgoing requests and routes every inbound frame to subscribers
//! registered under its dispatch name (event name for events, action name
//! otherwise, `"message"` when neither is set).

use crate::connection::{BackoffPolicy, ConnectionManager, ConnectionState, Endpoint};
use crate::error::{ConnectionError, SessionError, SessionResult};
use crate::event::SessionEvent;
use crate::registry::{Subscription, SubscriptionRegistry};
use crate::transport::{Connector, TungsteniteConnector};
use chat_common::{ClientConfig, TokenProvider};
use chat_protocol::{Frame, WsResponse};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

/// WebSocket protocol session
pub struct Session {
    connection: ConnectionManager,
    registry: SubscriptionRegistry,
}

impl Session {
    /// Create a session over an arbitrary connector
    pub fn new(endpoint: Endpoint, connector: Arc<dyn Connector>, policy: BackoffPolicy) -> Self {
        let registry = SubscriptionRegistry::new();
        let dispatcher = registry.clone();
        let connection = ConnectionManager::new(
            endpoint,
            connector,
            policy,
            registry.clone(),
            move |text: &str| {
                dispatch(&dispatcher, text);
            },
        );

        Self {
            connection,
            registry,
        }
    }

    /// Create a session for `config.ws_url`, presenting tokens from `tokens`
    pub fn from_config(config: &ClientConfig, tokens: Option<Arc<dyn TokenProvider>>) -> Self {
        let endpoint = match tokens {
            Some(tokens) => Endpoint::with_tokens(&config.ws_url, tokens),
            None => Endpoint::new(&config.ws_url),
        };
        Self::new(
            endpoint,
            Arc::new(TungsteniteConnector::new()),
            BackoffPolicy::from(config.reconnect),
        )
    }

    pub async fn connect(&self) -> Result<(), ConnectionError> {
        self.connection.connect().await
    }

    /// Send a request frame
    ///
    /// Returns `Ok(false)` when the connection is not open; the frame is
    /// dropped, not queued. Matching `request_id` to a response is up to the
    /// caller (see [`Session::request`] for a helper that does it).
    pub fn send<T>(&self, action: &str, data: &T, request_id: &str) -> SessionResult<bool>
    where
        T: Serialize + ?Sized,
    {
        let frame = Frame::request(action, request_id, serde_json::to_value(data)?);
        let json = frame.to_json()?;

        tracing::debug!(action = %action, request_id = %request_id, "Sending request");
        Ok(self.connection.send(json))
    }

    /// Subscribe to frames dispatched under `name`
    ///
    /// Also used for the synthetic [`crate::NET_ERROR`] and
    /// [`crate::AUTH_ERROR`] events.
    pub fn on<F>(&self, name: impl Into<String>, callback: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.registry.on(name, callback)
    }

    /// Send a request and wait for the response carrying the same id
    ///
    /// A fresh UUID is used as the request id. The temporary subscription is
    /// removed whether the response arrives or the wait times out.
    pub async fn request<T>(
        &self,
        action: &str,
        data: &T,
        timeout: Duration,
    ) -> SessionResult<WsResponse>
    where
        T: Serialize + ?Sized,
    {
        let request_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        let slot = Mutex::new(Some(tx));

        let expected = request_id.clone();
        let subscription = self.on(action, move |event| {
            let Some(response) = event.response() else {
                return;
            };
            if response.request_id != expected {
                return;
            }
            if let Some(tx) = slot.lock().take() {
                let _ = tx.send(response.clone());
            }
        });

        let result = match self.send(action, data, &request_id) {
            Ok(true) => match tokio::time::timeout(timeout, rx).await {
                Ok(Ok(response)) => Ok(response),
                Ok(Err(_)) => Err(SessionError::NotSent),
                Err(_) => Err(SessionError::Timeout {
                    action: action.to_string(),
                    timeout,
                }),
            },
            Ok(false) => Err(SessionError::NotSent),
            Err(e) => Err(e),
        };

        subscription.unsubscribe();
        result
    }

    /// Close deliberately; no reconnect follows
    pub fn close(&self) {
        self.connection.close();
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    #[must_use]
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    #[must_use]
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("connection", &self.connection)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Decode one inbound text frame and publish it
///
/// Malformed frames are dropped. Returns the number of callbacks invoked.
fn dispatch(registry: &SubscriptionRegistry, text: &str) -> usize {
    let frame = match Frame::from_json(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(error = %e, len = text.len(), "Dropping malformed frame");
            return 0;
        }
    };

    let name = frame.dispatch_key().to_string();
    tracing::trace!(name = %name, frame = %frame, "Dispatching frame");
    registry.emit(&name, &SessionEvent::Frame(frame))
}
