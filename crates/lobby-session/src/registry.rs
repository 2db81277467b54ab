//! The session registry: issues, validates, and revokes session tokens.
//!
//! # Concurrency note
//!
//! Every operation takes the same `tokio::sync::Mutex` over the token map
//! for its whole duration, so `issue`, `validate` and `revoke` are atomic
//! with respect to each other and a sliding-expiry update can never be
//! observed half-written. The map is private; callers only ever see
//! tokens and usernames.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::{Session, SessionConfig, SessionError};

/// Length of a generated token in bytes (256 bits of entropy).
const TOKEN_BYTES: usize = 32;

/// Maps opaque session tokens to the users who own them.
///
/// ```text
/// issue() ──→ [Active] ──validate()──→ [Active, expiry pushed out]
///                │
///                ├── revoke() ──────────→ removed
///                └── lookup past expiry ─→ removed (lazy)
/// ```
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
    config: SessionConfig,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Returns the registry's configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Starts a session for `username` and returns its token.
    ///
    /// Tokens come from the thread-local CSPRNG and are never checked for
    /// collisions; at 256 bits a collision is not a practical concern.
    pub async fn issue(&self, username: impl Into<String>) -> String {
        let username = username.into();
        let token = generate_token();
        let session = Session {
            username,
            expires_at: Instant::now() + self.config.ttl,
        };

        tracing::info!(username = %session.username, "session issued");
        self.sessions.lock().await.insert(token.clone(), session);
        token
    }

    /// Resolves `token` to its username, sliding the expiry forward.
    ///
    /// Returns `None` for unknown, revoked, or expired tokens. An expired
    /// entry is removed as a side effect.
    pub async fn validate(&self, token: &str) -> Option<String> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;

        match sessions.get_mut(token) {
            None => return None,
            Some(session) if !session.is_expired(now) => {
                session.expires_at = now + self.config.ttl;
                return Some(session.username.clone());
            }
            Some(_) => {}
        }

        if let Some(session) = sessions.remove(token) {
            tracing::debug!(username = %session.username, "session expired");
        }
        None
    }

    /// Like [`validate`](Self::validate), but for a token that may be
    /// missing from the request altogether.
    ///
    /// # Errors
    /// - [`SessionError::MissingToken`]: `token` is `None`
    /// - [`SessionError::InvalidToken`]: unknown, revoked, or expired
    pub async fn require(&self, token: Option<&str>) -> Result<String, SessionError> {
        let token = token.ok_or(SessionError::MissingToken)?;
        self.validate(token).await.ok_or(SessionError::InvalidToken)
    }

    /// Ends a session. Revoking an unknown or already-revoked token is a
    /// no-op.
    pub async fn revoke(&self, token: &str) {
        if let Some(session) = self.sessions.lock().await.remove(token) {
            tracing::info!(username = %session.username, "session revoked");
        }
    }

    /// Removes every expired entry and returns how many were dropped.
    ///
    /// Lazy expiry in [`validate`](Self::validate) is what keeps expired
    /// tokens unusable; this only reclaims memory held by tokens nobody
    /// presents again.
    pub async fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        before - sessions.len()
    }

    /// Spawns a task that calls [`sweep_expired`](Self::sweep_expired)
    /// every `config.sweep_interval`.
    ///
    /// Returns `None` when no interval is configured. The task holds only
    /// a weak reference and stops once the registry is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let period = self.config.sweep_interval?;
        let registry = Arc::downgrade(self);

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                let removed = registry.sweep_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "swept expired sessions");
                }
            }
        }))
    }

    /// Number of stored sessions, including expired ones not yet noticed.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Returns `true` if no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// Generates a 64-character lowercase hex token from 32 random bytes.
fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================
