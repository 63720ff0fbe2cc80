//! Established WebSocket connections.

use std::fmt;
use std::time::Instant;

use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::config::WebSocketConfig;
use crate::error::{CloseCode, WsError, WsResult};
use crate::message::Message;

/// Unique identifier of a connection, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Creates a new time-ordered identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An upgraded connection.
///
/// Pings are answered automatically while receiving. After a close frame
/// has been seen or sent, [`recv`](Self::recv) yields `None` and sends fail.
///
/// # Example
///
/// ```ignore
/// async fn echo(mut ws: UpgradedWebSocket) -> Result<(), WsError> {
///     while let Some(msg) = ws.recv().await {
///         if let Message::Text(text) = msg? {
///             ws.send(Message::text(text)).await?;
///         }
///     }
///     Ok(())
/// }
/// ```
pub struct WebSocket<S> {
    id: ConnectionId,
    stream: WebSocketStream<S>,
    config: WebSocketConfig,
    connected_at: Instant,
    closed: bool,
}

impl<S> WebSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an already-handshaken stream.
    pub fn new(stream: WebSocketStream<S>, config: WebSocketConfig) -> Self {
        Self {
            id: ConnectionId::new(),
            stream,
            config,
            connected_at: Instant::now(),
            closed: false,
        }
    }

    /// Returns the connection identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the configuration the connection was accepted with.
    pub fn config(&self) -> &WebSocketConfig {
        &self.config
    }

    /// Returns how long the connection has been open.
    pub fn age(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }

    /// Returns `true` once a close frame was seen or sent.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Receives the next message.
    #[instrument(skip(self), fields(connection_id = %self.id))]
    pub async fn recv(&mut self) -> Option<WsResult<Message>> {
        if self.closed {
            return None;
        }

        match self.stream.next().await {
            Some(Ok(raw)) => {
                let msg = Message::from(raw);
                match &msg {
                    Message::Ping(payload) => {
                        debug!("answering ping");
                        if let Err(err) = self.send(Message::Pong(payload.clone())).await {
                            self.closed = true;
                            return Some(Err(err));
                        }
                    }
                    Message::Close(frame) => {
                        debug!(code = frame.as_ref().map(|f| f.code), "peer closed");
                        self.closed = true;
                    }
                    _ => {}
                }
                Some(Ok(msg))
            }
            Some(Err(err)) => {
                self.closed = true;
                Some(Err(err.into()))
            }
            None => {
                self.closed = true;
                None
            }
        }
    }

    /// Receives the next data message and parses it as JSON, skipping
    /// control frames.
    pub async fn recv_json<T: DeserializeOwned>(&mut self) -> Option<WsResult<T>> {
        loop {
            match self.recv().await? {
                Ok(msg) if msg.is_control() => continue,
                Ok(msg) => return Some(msg.parse_json()),
                Err(err) => return Some(Err(err)),
            }
        }
    }

    /// Sends a message.
    pub async fn send(&mut self, msg: Message) -> WsResult<()> {
        if self.closed {
            return Err(WsError::closed(None, "connection already closed"));
        }
        self.stream.send(msg.into()).await?;
        Ok(())
    }

    /// Sends `value` as a JSON text message.
    pub async fn send_json<T: Serialize>(&mut self, value: &T) -> WsResult<()> {
        self.send(Message::json(value)?).await
    }

    /// Sends a close frame. Closing twice is a no-op.
    pub async fn close(&mut self, code: CloseCode, reason: impl Into<String>) -> WsResult<()> {
        if self.closed {
            return Ok(());
        }
        self.send(Message::close(code, reason)).await?;
        self.closed = true;
        Ok(())
    }
}

impl<S> fmt::Debug for WebSocket<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSocket")
            .field("id", &self.id)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;
    use tokio_tungstenite::tungstenite::protocol::Role;

    async fn pair() -> (WebSocket<tokio::io::DuplexStream>, WebSocket<tokio::io::DuplexStream>) {
        let (a, b) = duplex(64 * 1024);
        let server = WebSocketStream::from_raw_socket(a, Role::Server, None).await;
        let client = WebSocketStream::from_raw_socket(b, Role::Client, None).await;
        (
            WebSocket::new(server, WebSocketConfig::default()),
            WebSocket::new(client, WebSocketConfig::default()),
        )
    }

    #[test]
    fn test_connection_ids_are_unique() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }

    #[tokio::test]
    async fn test_text_round_trip() {
        let (mut server, mut client) = pair().await;

        client.send(Message::text("hello")).await.unwrap();
        let msg = server.recv().await.unwrap().unwrap();
        assert_eq!(msg.as_text(), Some("hello"));
    }

    #[tokio::test]
    async fn test_json_skips_control_frames() {
        let (mut server, mut client) = pair().await;

        client.send(Message::Pong(bytes::Bytes::new())).await.unwrap();
        client.send_json(&serde_json::json!({"n": 1})).await.unwrap();

        let value: serde_json::Value = server.recv_json().await.unwrap().unwrap();
        assert_eq!(value["n"], 1);
    }

    #[tokio::test]
    async fn test_close_stops_receiving() {
        let (mut server, mut client) = pair().await;

        client.close(CloseCode::Normal, "done").await.unwrap();
        assert!(client.is_closed());
        assert!(client.send(Message::text("late")).await.is_err());

        let msg = server.recv().await.unwrap().unwrap();
        assert!(msg.is_close());
        assert!(server.recv().await.is_none());
    }
}
