//! The directory: registration and authentication over a credential store.
//!
//! The gateway talks to a [`Directory`] and does not care whether it is
//! the in-process [`DirectoryService`] or a
//! [`RemoteDirectory`](crate::RemoteDirectory) reaching one over RPC.

use std::future::Future;
use std::sync::Arc;

use lobby_protocol::Credentials;

use crate::store::user_key;
use crate::{CredentialStore, DirectoryError};

/// Shortest password `register` accepts, in bytes.
pub const MIN_PASSWORD_LEN: usize = 6;

/// The user-record authority.
///
/// # Example
///
/// ```rust
/// use lobby_directory::{Directory, DirectoryError, DirectoryService, MemoryCredentialStore};
/// use lobby_protocol::Credentials;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let directory = DirectoryService::new(MemoryCredentialStore::new());
///
/// directory.register(&Credentials::new("alice", "secret1")).await.unwrap();
///
/// let again = directory.register(&Credentials::new("alice", "other12")).await;
/// assert!(matches!(again, Err(DirectoryError::Conflict(_))));
///
/// let who = directory.authenticate(&Credentials::new("alice", "secret1")).await;
/// assert_eq!(who.unwrap(), "alice");
/// # }
/// ```
pub trait Directory: Send + Sync + 'static {
    /// Creates a user record.
    ///
    /// # Errors
    /// - [`DirectoryError::InvalidInput`]: empty username, empty password,
    ///   or a password shorter than [`MIN_PASSWORD_LEN`]
    /// - [`DirectoryError::Conflict`]: the username is taken
    /// - [`DirectoryError::StoreUnavailable`] /
    ///   [`DirectoryError::BackendUnavailable`]: infrastructure failure
    fn register(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<(), DirectoryError>> + Send;

    /// Checks a username/password pair and returns the validated username.
    /// Has no side effect on the store.
    ///
    /// # Errors
    /// - [`DirectoryError::NotFound`]: no such user
    /// - [`DirectoryError::InvalidCredentials`]: wrong password
    /// - [`DirectoryError::StoreUnavailable`] /
    ///   [`DirectoryError::BackendUnavailable`]: infrastructure failure
    fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<String, DirectoryError>> + Send;
}

impl<D: Directory> Directory for Arc<D> {
    fn register(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<(), DirectoryError>> + Send {
        (**self).register(credentials)
    }

    fn authenticate(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<String, DirectoryError>> + Send {
        (**self).authenticate(credentials)
    }
}

/// A [`Directory`] backed directly by a [`CredentialStore`].
#[derive(Debug, Clone)]
pub struct DirectoryService<S> {
    store: S,
}

impl<S: CredentialStore> DirectoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: CredentialStore> Directory for DirectoryService<S> {
    async fn register(&self, credentials: &Credentials) -> Result<(), DirectoryError> {
        validate(credentials)?;
        let username = credentials.username.as_str();
        let key = user_key(username);

        if self.store.exists(&key).await? {
            tracing::debug!(%username, "register rejected: username taken");
            return Err(DirectoryError::Conflict(username.to_owned()));
        }

        // Another registration may have slipped in since the check above.
        // Only one insert can win.
        if !self.store.set_if_absent(&key, &credentials.password).await? {
            tracing::info!(%username, "register lost a race for the same username");
            return Err(DirectoryError::Conflict(username.to_owned()));
        }

        tracing::info!(%username, "user registered");
        Ok(())
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<String, DirectoryError> {
        let username = credentials.username.as_str();
        let stored = self
            .store
            .get(&user_key(username))
            .await?
            .ok_or(DirectoryError::NotFound)?;

        if stored != credentials.password {
            tracing::debug!(%username, "authentication rejected");
            return Err(DirectoryError::InvalidCredentials);
        }

        tracing::debug!(%username, "authenticated");
        Ok(credentials.username.clone())
    }
}

fn validate(credentials: &Credentials) -> Result<(), DirectoryError> {
    if credentials.username.is_empty() {
        return Err(DirectoryError::InvalidInput("username is required".into()));
    }
    if credentials.password.is_empty() {
        return Err(DirectoryError::InvalidInput("password is required".into()));
    }
    if credentials.password.len() < MIN_PASSWORD_LEN {
        return Err(DirectoryError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryCredentialStore;

    fn service() -> DirectoryService<MemoryCredentialStore> {
        DirectoryService::new(MemoryCredentialStore::new())
    }

    // =====================================================================
    // validate
    // =====================================================================

    #[test]
    fn test_validate_empty_username_is_invalid() {
        let err = validate(&Credentials::new("", "secret1")).unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_empty_password_is_invalid() {
        let err = validate(&Credentials::new("alice", "")).unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_short_password_is_invalid() {
        let err = validate(&Credentials::new("alice", "12345")).unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidInput(_)));
        assert!(validate(&Credentials::new("alice", "123456")).is_ok());
    }

    // =====================================================================
    // register
    // =====================================================================

    #[tokio::test]
    async fn test_register_stores_password_under_user_key() {
        let directory = service();
        directory
            .register(&Credentials::new("alice", "secret1"))
            .await
            .unwrap();

        let stored = directory.store().get("user:alice").await.unwrap();
        assert_eq!(stored.as_deref(), Some("secret1"));
    }

    #[tokio::test]
    async fn test_register_duplicate_returns_conflict_and_keeps_first() {
        let directory = service();
        directory
            .register(&Credentials::new("alice", "secret1"))
            .await
            .unwrap();

        let err = directory
            .register(&Credentials::new("alice", "other12"))
            .await
            .unwrap_err();

        assert_eq!(err, DirectoryError::Conflict("alice".into()));
        let stored = directory.store().get("user:alice").await.unwrap();
        assert_eq!(stored.as_deref(), Some("secret1"));
    }

    #[tokio::test]
    async fn test_register_distinct_usernames_all_succeed() {
        let directory = service();
        for name in ["alice", "bob", "carol", "dave"] {
            directory
                .register(&Credentials::new(name, "secret1"))
                .await
                .unwrap();
        }
        assert_eq!(directory.store().len(), 4);
    }

    #[tokio::test]
    async fn test_register_invalid_input_never_touches_store() {
        let directory = service();
        let err = directory
            .register(&Credentials::new("alice", "123"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidInput(_)));
        assert!(directory.store().is_empty());
    }

    // =====================================================================
    // authenticate
    // =====================================================================

    #[tokio::test]
    async fn test_authenticate_correct_password_returns_username() {
        let directory = service();
        directory
            .register(&Credentials::new("alice", "secret1"))
            .await
            .unwrap();

        let username = directory
            .authenticate(&Credentials::new("alice", "secret1"))
            .await
            .unwrap();
        assert_eq!(username, "alice");
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password_is_invalid_credentials() {
        let directory = service();
        directory
            .register(&Credentials::new("alice", "secret1"))
            .await
            .unwrap();

        let err = directory
            .authenticate(&Credentials::new("alice", "wrongpass"))
            .await
            .unwrap_err();
        assert_eq!(err, DirectoryError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user_is_not_found() {
        let err = service()
            .authenticate(&Credentials::new("nobody", "secret1"))
            .await
            .unwrap_err();
        assert_eq!(err, DirectoryError::NotFound);
    }

    #[tokio::test]
    async fn test_directory_through_arc() {
        let directory = Arc::new(service());
        directory
            .register(&Credentials::new("alice", "secret1"))
            .await
            .unwrap();
        assert_eq!(
            directory
                .authenticate(&Credentials::new("alice", "secret1"))
                .await
                .unwrap(),
            "alice"
        );
    }
}
