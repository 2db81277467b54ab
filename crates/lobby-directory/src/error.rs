//! Error types for the directory and its credential stores.

/// A credential store could not complete a call.
///
/// Backends squash their own error types into a message: callers only ever
/// need to know that the store is unavailable, never why.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Backend(String),
}

/// Errors returned by [`Directory`](crate::Directory) operations.
///
/// Each variant has a stable [`code`](Self::code) that travels over the
/// RPC surface, so a remote client can rebuild the same variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// Missing username, missing password, or a password that is too short.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Registration for a username that already has a record.
    #[error("username {0:?} is already taken")]
    Conflict(String),

    /// No record exists for the username.
    ///
    /// The message differs from [`InvalidCredentials`](Self::InvalidCredentials),
    /// so RPC callers can tell the two apart. The gateway folds both into a
    /// single 401.
    #[error("user not found")]
    NotFound,

    /// A record exists but the password does not match.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The credential store behind the directory failed.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    /// The directory itself could not be reached, timed out, or replied
    /// with something unreadable.
    #[error("directory unavailable: {0}")]
    BackendUnavailable(String),
}

impl DirectoryError {
    /// Stable wire code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Conflict(_) => "conflict",
            Self::NotFound => "not_found",
            Self::InvalidCredentials => "invalid_credentials",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::BackendUnavailable(_) => "backend_unavailable",
        }
    }

    /// Returns `true` for infrastructure failures (as opposed to a caller
    /// mistake or a rejected credential).
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::BackendUnavailable(_))
    }
}
