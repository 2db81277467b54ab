//! `lobby-directory`: serves the directory RPC over a credential store.
//!
//! ```text
//! lobby-directory --bind 0.0.0.0:50051 --redis-url redis://127.0.0.1:6379
//! ```
//!
//! Without `--redis-url` the records live in memory and vanish on exit.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use lobby_directory::{CredentialStore, DirectoryService, MemoryCredentialStore, rpc};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "lobby-directory", version, about = "Lobby user directory")]
struct Args {
    /// Address the RPC server listens on.
    #[arg(long, env = "LOBBY_DIRECTORY_BIND", default_value = "0.0.0.0:50051")]
    bind: SocketAddr,

    /// Redis URL for persistent records. Omit to keep records in memory.
    #[arg(long, env = "LOBBY_REDIS_URL")]
    redis_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    match args.redis_url {
        #[cfg(feature = "redis")]
        Some(url) => {
            let store = lobby_directory::RedisCredentialStore::connect(&url).await?;
            serve(store, args.bind).await
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => Err("built without the `redis` feature".into()),
        None => {
            tracing::warn!("no redis url given, user records are kept in memory");
            serve(MemoryCredentialStore::new(), args.bind).await
        }
    }
}

async fn serve<S: CredentialStore>(
    store: S,
    bind: SocketAddr,
) -> Result<(), Box<dyn std::error::Error>> {
    let directory = Arc::new(DirectoryService::new(store));
    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "directory listening");

    axum::serve(listener, rpc::router(directory)).await?;
    Ok(())
}
