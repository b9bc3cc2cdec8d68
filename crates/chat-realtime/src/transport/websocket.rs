//! `tokio-tungstenite` backed connector

use super::{Connector, Outbound, Transport, TransportEvent};
use crate::error::TransportError;
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects over `ws://` or `wss://`
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<Transport, TransportError> {
        let (stream, response) = connect_async(url).await?;
        tracing::debug!(status = %response.status(), "WebSocket handshake complete");

        let (transport, peer) = Transport::channel();
        let (sink, stream) = stream.split();

        tokio::spawn(write_pump(sink, peer.outbound));
        tokio::spawn(read_pump(stream, peer.inbound));

        Ok(transport)
    }
}

/// Forward outbound frames to the socket until closed or released
async fn write_pump(
    mut sink: SplitSink<WsStream, Message>,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) {
    while let Some(frame) = outbound.recv().await {
        match frame {
            Outbound::Text(text) => {
                if let Err(e) = sink.send(Message::Text(text)).await {
                    tracing::debug!(error = %e, "WebSocket write failed");
                    break;
                }
            }
            Outbound::Close => break,
        }
    }

    if let Err(e) = sink.close().await {
        tracing::trace!(error = %e, "WebSocket close after shutdown");
    }
}

/// Forward socket frames inbound, finishing with exactly one `Closed`
async fn read_pump(mut stream: SplitStream<WsStream>, inbound: mpsc::UnboundedSender<TransportEvent>) {
    let reason = loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => {
                if inbound.send(TransportEvent::Message(text)).is_err() {
                    break None;
                }
            }
            Some(Ok(Message::Close(frame))) => {
                break frame.map(|f| f.reason.to_string());
            }
            Some(Ok(Message::Binary(bytes))) => {
                tracing::debug!(len = bytes.len(), "Ignoring binary frame");
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::debug!(error = %e, "WebSocket read failed");
                break None;
            }
            None => break None,
        }
    };

    let _ = inbound.send(TransportEvent::Closed { reason });
}
