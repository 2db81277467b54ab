//! `lobby-server`: the HTTP/WebSocket gateway.
//!
//! By default it reaches a separate `lobby-directory` process over RPC:
//!
//! ```text
//! lobby-directory --bind 127.0.0.1:50051 &
//! lobby-server --bind 0.0.0.0:8080 --directory-url http://127.0.0.1:50051 --public-dir ./public
//! ```
//!
//! With `--embedded-directory` the directory runs in-process instead,
//! over Redis when `--redis-url` is given and in memory otherwise.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use lobby::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "lobby-server", version, about = "Lobby chat gateway")]
struct Args {
    /// Address the gateway listens on.
    #[arg(long, env = "LOBBY_BIND", default_value = "0.0.0.0:8080")]
    bind: String,

    /// Base URL of the directory RPC service.
    #[arg(long, env = "LOBBY_DIRECTORY_URL", default_value = "http://127.0.0.1:50051")]
    directory_url: String,

    /// Run the directory in this process instead of calling out to one.
    #[arg(long, env = "LOBBY_EMBEDDED_DIRECTORY")]
    embedded_directory: bool,

    /// Redis URL for the embedded directory's records.
    #[arg(long, env = "LOBBY_REDIS_URL", requires = "embedded_directory")]
    redis_url: Option<String>,

    /// Directory of static files to serve (e.g. `./public`).
    #[arg(long, env = "LOBBY_PUBLIC_DIR")]
    public_dir: Option<PathBuf>,

    /// Deadline for each directory call, in milliseconds.
    #[arg(long, env = "LOBBY_DIRECTORY_TIMEOUT_MS", default_value_t = 5000)]
    directory_timeout_ms: u64,

    /// Sweep expired sessions every this many seconds. Off by default.
    #[arg(long, env = "LOBBY_SESSION_SWEEP_SECS")]
    session_sweep_secs: Option<u64>,

    /// Mark the session cookie `Secure` (serve over HTTPS).
    #[arg(long, env = "LOBBY_COOKIE_SECURE")]
    cookie_secure: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lobby::init_tracing("info");
    let args = Args::parse();

    let directory_timeout = Duration::from_millis(args.directory_timeout_ms);
    let mut builder = LobbyServer::builder()
        .bind(&args.bind)
        .directory_timeout(directory_timeout)
        .cookie_secure(args.cookie_secure)
        .session_config(SessionConfig {
            sweep_interval: args.session_sweep_secs.map(Duration::from_secs),
            ..SessionConfig::default()
        });
    if let Some(dir) = args.public_dir {
        builder = builder.public_dir(dir);
    }

    if !args.embedded_directory {
        tracing::info!(url = %args.directory_url, "using remote directory");
        let directory = RemoteDirectory::new(RpcClientConfig {
            base_url: args.directory_url,
            timeout: directory_timeout,
        })?;
        builder.build(directory).await?.run().await?;
        return Ok(());
    }

    match args.redis_url {
        #[cfg(feature = "redis")]
        Some(url) => {
            let store = RedisCredentialStore::connect(&url).await?;
            builder
                .build(DirectoryService::new(store))
                .await?
                .run()
                .await?;
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => return Err("built without the `redis` feature".into()),
        None => {
            tracing::warn!("embedded directory keeps user records in memory");
            builder
                .build(DirectoryService::new(MemoryCredentialStore::new()))
                .await?
                .run()
                .await?;
        }
    }
    Ok(())
}
