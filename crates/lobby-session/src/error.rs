//! Error types for the session layer.

/// Why a request could not be tied to a live session.
///
/// An expired token and an unknown token are deliberately the same error:
/// once expiry is noticed the entry is gone, so the two are
/// indistinguishable anyway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The request carried no session token at all.
    #[error("no session token presented")]
    MissingToken,

    /// The token is unknown, revoked, or expired.
    #[error("session is invalid or expired")]
    InvalidToken,
}
