//! WebSocket connection halves over an upgraded axum socket.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, TransportError};

/// Splits an upgraded socket into its write half (handed to the hub) and
/// its read half (kept by the connection's own task).
pub fn split(socket: WebSocket) -> (WebSocketConnection, WebSocketReader) {
    let id = ConnectionId::next();
    let (sink, stream) = socket.split();
    tracing::debug!(%id, "WebSocket connection split");
    (
        WebSocketConnection {
            id,
            sink: Mutex::new(sink),
        },
        WebSocketReader { id, stream },
    )
}

/// The write half of a WebSocket.
pub struct WebSocketConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl Connection for WebSocketConnection {
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        // JSON payloads go out as text frames so browsers get a string.
        let msg = match std::str::from_utf8(data) {
            Ok(text) => Message::Text(text.to_owned().into()),
            Err(_) => Message::Binary(data.to_vec().into()),
        };
        self.sink.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink.lock().await.close().await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// The read half of a WebSocket.
pub struct WebSocketReader {
    id: ConnectionId,
    stream: SplitStream<WebSocket>,
}

impl WebSocketReader {
    /// Returns the id shared with the matching [`WebSocketConnection`].
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Receives the next data frame from the peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    /// Ping/pong frames are skipped; axum answers pings itself.
    pub async fn recv(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_str().as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    return Ok(Some(data.to_vec()));
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
    }
}
