//! `LobbyServer` builder and server loop.
//!
//! This is the entry point for running a Lobby gateway. It ties together
//! all the layers: directory → session → hub → HTTP/WebSocket routes.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use lobby_directory::Directory;
use lobby_hub::{HubConfig, spawn_hub};
use lobby_protocol::JsonCodec;
use lobby_session::{SessionConfig, SessionRegistry};
use tokio::net::TcpListener;

use crate::routes::{self, AppState};
use crate::{GatewayConfig, LobbyError};

/// Builder for configuring and starting a Lobby server.
///
/// # Example
///
/// ```rust,no_run
/// use lobby::prelude::*;
///
/// # async fn run() -> Result<(), LobbyError> {
/// let directory = RemoteDirectory::new(RpcClientConfig::default())?;
/// let server = LobbyServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(directory)
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct LobbyServerBuilder {
    config: GatewayConfig,
    session_config: SessionConfig,
    hub_config: HubConfig,
}

impl LobbyServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the deadline for each directory call.
    pub fn directory_timeout(mut self, timeout: Duration) -> Self {
        self.config.directory_timeout = timeout;
        self
    }

    /// Serves static files from `dir` for unmatched `GET` paths.
    pub fn public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.public_dir = Some(dir.into());
        self
    }

    /// Marks the session cookie `Secure`.
    pub fn cookie_secure(mut self, secure: bool) -> Self {
        self.config.cookie_secure = secure;
        self
    }

    /// Replaces the whole gateway configuration.
    pub fn gateway_config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the hub configuration.
    pub fn hub_config(mut self, config: HubConfig) -> Self {
        self.hub_config = config;
        self
    }

    /// Starts the hub (and the session sweeper, if configured) and returns
    /// the application router without binding a listener.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn into_router<D: Directory>(self, directory: D) -> Router {
        let sessions = Arc::new(SessionRegistry::new(self.session_config));
        if sessions.spawn_sweeper().is_some() {
            tracing::info!("session sweeper started");
        }

        let state = AppState {
            sessions,
            hub: spawn_hub(self.hub_config, JsonCodec),
            directory: Arc::new(directory),
            config: Arc::new(self.config),
        };
        routes::router(state)
    }

    /// Binds the listener and wires everything up.
    ///
    /// # Errors
    /// [`LobbyError::Io`] if the address cannot be bound.
    pub async fn build<D: Directory>(self, directory: D) -> Result<LobbyServer, LobbyError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        let router = self.into_router(directory);
        Ok(LobbyServer { listener, router })
    }
}

/// A bound Lobby server.
///
/// Call [`run()`](Self::run) to start serving.
pub struct LobbyServer {
    listener: TcpListener,
    router: Router,
}

impl LobbyServer {
    /// Creates a new builder.
    pub fn builder() -> LobbyServerBuilder {
        LobbyServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, LobbyError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves HTTP and WebSocket traffic until the process is terminated.
    pub async fn run(self) -> Result<(), LobbyError> {
        tracing::info!(addr = %self.local_addr()?, "lobby server listening");
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_setters_update_config() {
        let builder = LobbyServerBuilder::new()
            .bind("0.0.0.0:9000")
            .directory_timeout(Duration::from_millis(250))
            .public_dir("./public")
            .cookie_secure(true);

        assert_eq!(builder.config.bind_addr, "0.0.0.0:9000");
        assert_eq!(builder.config.directory_timeout, Duration::from_millis(250));
        assert_eq!(builder.config.public_dir, Some(PathBuf::from("./public")));
        assert!(builder.config.cookie_secure);
    }

    #[tokio::test]
    async fn test_build_port_zero_reports_bound_addr() {
        let server = LobbyServer::builder()
            .bind("127.0.0.1:0")
            .build(lobby_directory::DirectoryService::new(
                lobby_directory::MemoryCredentialStore::new(),
            ))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_build_unbindable_address_is_io_error() {
        let result = LobbyServer::builder()
            .bind("not an address")
            .build(lobby_directory::DirectoryService::new(
                lobby_directory::MemoryCredentialStore::new(),
            ))
            .await;
        assert!(matches!(result, Err(LobbyError::Io(_))));
    }
}
