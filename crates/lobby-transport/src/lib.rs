//! Transport abstraction layer for Lobby.
//!
//! Provides the [`Connection`] trait the hub writes through, the opaque
//! [`ConnectionId`] it keys its registry by, and (behind the `websocket`
//! feature) the two halves of an upgraded WebSocket.
//!
//! The upgrade handshake itself belongs to the HTTP layer; this crate only
//! starts once a socket exists.
//!
//! # Feature Flags
//!
//! - `websocket` (default): connection halves over an axum `WebSocket`

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketReader, split};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-unique `ConnectionId`.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The outbound half of a live connection.
///
/// The hub holds one of these per joined client and is its only writer.
/// Reads stay with the task that owns the inbound half.
///
/// The returned futures are `Send` so the hub's dispatcher can drive them
/// from a spawned task.
pub trait Connection: Send + Sync + 'static {
    /// Sends one message to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Closes the connection. Closing an already-closed connection is
    /// not an error worth acting on; callers log and move on.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
