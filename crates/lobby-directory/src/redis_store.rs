//! Redis-backed credential store.

use redis::AsyncCommands;
use redis::Client;
use redis::aio::ConnectionManager;

use crate::{CredentialStore, StoreError};

/// Credential store over a Redis [`ConnectionManager`], which reconnects
/// on its own after a dropped connection.
///
/// Uses `EXISTS`, `GET`, `SET` and `SETNX`. Clones share the connection.
#[derive(Clone)]
pub struct RedisCredentialStore {
    conn: ConnectionManager,
}

impl RedisCredentialStore {
    /// Connects to the Redis server at `url` (e.g. `redis://127.0.0.1:6379`).
    ///
    /// # Errors
    /// [`StoreError::Backend`] if the URL is invalid or the first
    /// connection attempt fails.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        tracing::info!(url = %mask_redis_url(url), "connecting to redis");

        let client = Client::open(url).map_err(map_err)?;
        let conn = ConnectionManager::new(client).await.map_err(map_err)?;

        tracing::info!("connected to redis");
        Ok(Self { conn })
    }

    /// Wraps an existing connection manager.
    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

impl CredentialStore for RedisCredentialStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        conn.exists(key).await.map_err(map_err)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(map_err)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await.map_err(map_err)?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        conn.set_nx(key, value).await.map_err(map_err)
    }
}

fn map_err(e: redis::RedisError) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// Hides the password in a Redis URL so it can be logged.
fn mask_redis_url(url: &str) -> String {
    let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
    match url.rfind('@') {
        Some(at) if at > scheme_end => match url[scheme_end..at].find(':') {
            Some(colon) => format!("{}:****{}", &url[..scheme_end + colon], &url[at..]),
            None => url.to_owned(),
        },
        _ => url.to_owned(),
    }
}
