//! # Lobby
//!
//! Real-time presence and broadcast chat hub.
//!
//! Clients register and log in over HTTP, get a session cookie, then open
//! a WebSocket and join a single shared room: every member receives every
//! chat message plus join/leave notifications, in one global order.
//!
//! ## Layers
//!
//! ```text
//! lobby (this crate)    HTTP routes, WebSocket handler, server builder
//!   ├─ lobby-directory  register/authenticate, credential stores, RPC
//!   ├─ lobby-session    session tokens with sliding expiry
//!   ├─ lobby-hub        connection registry + ordered broadcast
//!   ├─ lobby-protocol   wire messages and codecs
//!   └─ lobby-transport  connection abstraction over WebSocket
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lobby::prelude::*;
//!
//! # async fn run() -> Result<(), LobbyError> {
//! // Embedded in-memory directory; use `RemoteDirectory` to reach a
//! // separate `lobby-directory` process instead.
//! let directory = DirectoryService::new(MemoryCredentialStore::new());
//! LobbyServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(directory)
//!     .await?
//!     .run()
//!     .await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod routes;
mod server;

pub use config::GatewayConfig;
pub use error::{GatewayError, LobbyError};
pub use routes::SESSION_COOKIE;
pub use server::{LobbyServer, LobbyServerBuilder};

use tracing_subscriber::EnvFilter;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"info"`) when it is unset or invalid.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Common imports for building and running a Lobby server.
pub mod prelude {
    pub use crate::{GatewayConfig, GatewayError, LobbyError, LobbyServer, LobbyServerBuilder};

    pub use lobby_directory::{
        CredentialStore, Directory, DirectoryError, DirectoryService, MemoryCredentialStore,
        RemoteDirectory, RpcClientConfig,
    };
    #[cfg(feature = "redis")]
    pub use lobby_directory::RedisCredentialStore;
    pub use lobby_hub::HubConfig;
    pub use lobby_protocol::{BroadcastEvent, Credentials};
    pub use lobby_session::SessionConfig;
}
