//! Types that travel on the wire.
//!
//! Both directions of the duplex connection share one JSON shape:
//!
//! ```text
//! {"type": "userJoined" | "userLeft" | "message", "username": "...", "content": "..."}
//! ```
//!
//! `content` is present only on `message`. The server builds outbound
//! frames from [`BroadcastEvent`]; inbound frames are read as
//! [`InboundMessage`], which deliberately has no `username` field.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BroadcastEvent: server → every member
// ---------------------------------------------------------------------------

/// One event fanned out to every connection registered when it is dequeued.
///
/// `#[serde(tag = "type")]` produces the flat `{"type": ..., ...}` shape
/// clients expect instead of serde's default `{"Joined": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BroadcastEvent {
    /// A connection for `username` joined the room.
    #[serde(rename = "userJoined")]
    Joined { username: String },

    /// A connection for `username` left (closed, errored, or was dropped
    /// after a failed write).
    #[serde(rename = "userLeft")]
    Left { username: String },

    /// `username` said `content`.
    #[serde(rename = "message")]
    Chat { username: String, content: String },
}

impl BroadcastEvent {
    /// The username the event is attributed to.
    pub fn username(&self) -> &str {
        match self {
            Self::Joined { username }
            | Self::Left { username }
            | Self::Chat { username, .. } => username,
        }
    }

    /// The wire `type` tag, handy for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Joined { .. } => "userJoined",
            Self::Left { .. } => "userLeft",
            Self::Chat { .. } => "message",
        }
    }
}

// ---------------------------------------------------------------------------
// InboundMessage: client → server
// ---------------------------------------------------------------------------

/// The `type` tag of an inbound frame.
///
/// Anything the server does not recognise decodes as `Unknown` rather than
/// failing, so a newer client cannot knock an older server's reader over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InboundKind {
    Message,
    UserJoined,
    UserLeft,
    #[serde(other)]
    Unknown,
}

/// A frame read from a client.
///
/// Any `username` the client puts in the frame is dropped during decoding
/// (serde ignores unknown fields); identity comes from the session only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(rename = "type")]
    pub kind: InboundKind,
    #[serde(default)]
    pub content: Option<String>,
}

impl InboundMessage {
    /// The chat content, if this is a chat frame.
    ///
    /// Join/leave notifications are the server's to make, so forged ones
    /// (and unknown types) yield `None`. A chat frame without `content`
    /// is an empty message.
    pub fn into_chat(self) -> Option<String> {
        match self.kind {
            InboundKind::Message => Some(self.content.unwrap_or_default()),
            InboundKind::UserJoined | InboundKind::UserLeft | InboundKind::Unknown => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// A username/password pair, as sent to `/api/register`, `/api/login` and
/// the directory RPC.
///
/// Missing fields decode as empty strings so validation, not parsing,
/// decides what "invalid input" means.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Keeps passwords out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
