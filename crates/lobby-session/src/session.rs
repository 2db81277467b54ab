//! Session types: what the registry stores per token.

use std::time::Duration;

use tokio::time::Instant;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long a session stays valid after issue or after its last
    /// successful validation.
    ///
    /// Default: 24 hours.
    pub ttl: Duration,

    /// How often the background sweeper removes expired entries.
    /// `None` (the default) relies purely on lazy expiry at lookup time.
    pub sweep_interval: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            sweep_interval: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A live session: who it belongs to and when it lapses.
///
/// State machine per token:
///
/// ```text
///   Active(username, expires_at) ──(lookup after expires_at)──→ removed
///        ↑            │
///        └─(validate)─┘   expires_at = now + ttl
/// ```
///
/// `Instant` is `tokio::time::Instant` so tests can pause and advance the
/// clock instead of sleeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The authenticated owner.
    pub username: String,

    /// Absolute expiry. Extended on every successful validation.
    pub expires_at: Instant,
}

impl Session {
    /// Returns `true` once `now` is strictly past the expiry instant.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}
