//! Gateway configuration.

use std::path::PathBuf;
use std::time::Duration;

/// HTTP-side settings. Session and hub settings live in
/// [`SessionConfig`](lobby_session::SessionConfig) and
/// [`HubConfig`](lobby_hub::HubConfig).
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to listen on.
    ///
    /// Default: `127.0.0.1:8080`.
    pub bind_addr: String,

    /// Deadline for each register/login call to the directory. Expiry is
    /// reported as a backend failure (500).
    ///
    /// Default: 5 seconds.
    pub directory_timeout: Duration,

    /// Directory of static files served for any `GET` no route matches.
    /// `None` serves nothing extra.
    pub public_dir: Option<PathBuf>,

    /// Marks the session cookie `Secure`. Turn on behind HTTPS.
    ///
    /// Default: `false`.
    pub cookie_secure: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            directory_timeout: Duration::from_secs(5),
            public_dir: None,
            cookie_secure: false,
        }
    }
}
