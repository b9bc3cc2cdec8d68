//! Scripted WebSocket peer
//!
//! Accepts connections and hands each one to the test, which then plays the
//! server side frame by frame.

use anyhow::{anyhow, bail, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_hdr_async, WebSocketStream};

/// Listening WebSocket server
pub struct MockWsServer {
    pub addr: SocketAddr,
    connections: mpsc::UnboundedReceiver<PeerConnection>,
    accepted: Arc<AtomicUsize>,
    _handle: JoinHandle<()>,
}

impl MockWsServer {
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, connections) = mpsc::unbounded_channel();
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&accepted);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let mut uri = String::new();
                let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                    uri = request.uri().to_string();
                    Ok(response)
                };
                let Ok(ws) = accept_hdr_async(stream, callback).await else {
                    continue;
                };
                counter.fetch_add(1, Ordering::SeqCst);
                if tx.send(PeerConnection { uri, ws }).is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            addr,
            connections,
            accepted,
            _handle: handle,
        })
    }

    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Wait for the next accepted connection
    pub async fn next_connection(&mut self, timeout: Duration) -> Result<PeerConnection> {
        tokio::time::timeout(timeout, self.connections.recv())
            .await
            .map_err(|_| anyhow!("no connection within {timeout:?}"))?
            .ok_or_else(|| anyhow!("server stopped"))
    }

    /// Number of completed handshakes so far
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

/// Server side of one accepted socket
pub struct PeerConnection {
    /// Request target of the handshake, e.g. `/ws?token=abc`
    pub uri: String,
    ws: WebSocketStream<TcpStream>,
}

impl PeerConnection {
    /// Value of the `token` query parameter
    pub fn token(&self) -> Option<String> {
        let url = url::Url::parse(&format!("ws://peer{}", self.uri)).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
    }

    pub async fn send_json(&mut self, value: &Value) -> Result<()> {
        self.ws.send(Message::Text(value.to_string())).await?;
        Ok(())
    }

    /// Next text frame, parsed as JSON
    pub async fn recv_json(&mut self, timeout: Duration) -> Result<Value> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let next = tokio::time::timeout_at(deadline, self.ws.next())
                .await
                .map_err(|_| anyhow!("no frame within {timeout:?}"))?;
            match next {
                Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(&text)?),
                Some(Ok(Message::Close(_))) | None => bail!("peer closed"),
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Wait until the client closes the socket
    pub async fn expect_close(&mut self, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let next = tokio::time::timeout_at(deadline, self.ws.next())
                .await
                .map_err(|_| anyhow!("client did not close within {timeout:?}"))?;
            match next {
                Some(Ok(Message::Close(_)) | Err(_)) | None => return Ok(()),
                Some(Ok(_)) => {}
            }
        }
    }

    /// Close with a textual reason
    pub async fn close_with_reason(mut self, reason: &str) -> Result<()> {
        let frame = CloseFrame {
            code: CloseCode::Policy,
            reason: reason.to_string().into(),
        };
        self.ws.close(Some(frame)).await?;
        Ok(())
    }

    /// Drop the TCP connection without a close handshake
    pub fn drop_connection(self) {
        drop(self.ws);
    }
}
