//! Codec trait and the JSON implementation.
//!
//! The hub never calls `serde_json` directly: it encodes each
//! [`BroadcastEvent`](crate::BroadcastEvent) through a [`Codec`], once per
//! event, and writes the same bytes to every recipient.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back.
///
/// `Send + Sync + 'static` because the codec is moved into the hub's
/// dispatcher task and lives as long as it does.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns a [`ProtocolError`] if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the bytes are malformed or do
    /// not match the expected shape.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that speaks JSON via `serde_json`.
///
/// ```rust
/// use lobby_protocol::{BroadcastEvent, Codec, JsonCodec};
///
/// let bytes = JsonCodec
///     .encode(&BroadcastEvent::Joined { username: "bob".into() })
///     .unwrap();
/// assert_eq!(bytes, br#"{"type":"userJoined","username":"bob"}"#);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
