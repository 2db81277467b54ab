//! Wire protocol for Lobby.
//!
//! - **Types** ([`BroadcastEvent`], [`InboundMessage`], [`Credentials`]):
//!   what travels between clients, the gateway and the directory.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those values become
//!   bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! The protocol layer knows nothing about connections or sessions; it only
//! knows message shapes.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{BroadcastEvent, Credentials, InboundKind, InboundMessage};
