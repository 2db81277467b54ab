//! User directory for Lobby.
//!
//! Owns user records: `register` creates one, `authenticate` checks a
//! password against one. Records live in a [`CredentialStore`] (in memory,
//! or Redis behind the `redis` feature) as `user:<username>` → password.
//!
//! The directory usually runs as its own process (the `lobby-directory`
//! binary) and the gateway reaches it through [`RemoteDirectory`]; both
//! sides implement the same [`Directory`] trait, so the gateway can also
//! embed a [`DirectoryService`] directly.
//!
//! Passwords are stored and compared in plaintext.
//!
//! # Feature Flags
//!
//! - `redis` (default): [`RedisCredentialStore`]

mod error;
#[cfg(feature = "redis")]
mod redis_store;
pub mod rpc;
mod service;
mod store;

pub use error::{DirectoryError, StoreError};
#[cfg(feature = "redis")]
pub use redis_store::RedisCredentialStore;
pub use rpc::{RemoteDirectory, RpcClientConfig};
pub use service::{Directory, DirectoryService, MIN_PASSWORD_LEN};
pub use store::{CredentialStore, MemoryCredentialStore, user_key};
