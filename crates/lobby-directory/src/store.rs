//! Credential storage.
//!
//! The directory keeps one record per user under the key `user:<username>`,
//! with the password as the value. Passwords are stored exactly as given:
//! there is no hashing anywhere in this crate.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::StoreError;

/// Builds the store key for a username.
pub fn user_key(username: &str) -> String {
    format!("user:{username}")
}

/// A key-value store holding user records.
///
/// `exists`, `get` and `set` are the plain operations every key-value
/// backend has. `set_if_absent` is the atomic insert the directory uses to
/// make registration race-free; it returns `false` when the key was
/// already present and leaves the existing value untouched.
pub trait CredentialStore: Send + Sync + 'static {
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, StoreError>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn set_if_absent(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// MemoryCredentialStore
// ---------------------------------------------------------------------------

/// In-process store backed by a [`DashMap`].
///
/// Clones share the same map. Never fails.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    records: Arc<DashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.records.contains_key(key))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.records.get(key).map(|value| value.clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.records.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        match self.records.entry(key.to_owned()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(value.to_owned());
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_key_prefixes_username() {
        assert_eq!(user_key("alice"), "user:alice");
    }

    #[tokio::test]
    async fn test_memory_store_set_then_get() {
        let store = MemoryCredentialStore::new();
        assert!(!store.exists("user:alice").await.unwrap());

        store.set("user:alice", "secret1").await.unwrap();

        assert!(store.exists("user:alice").await.unwrap());
        assert_eq!(
            store.get("user:alice").await.unwrap().as_deref(),
            Some("secret1")
        );
        assert_eq!(store.get("user:bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_store_set_overwrites() {
        let store = MemoryCredentialStore::new();
        store.set("user:alice", "first1").await.unwrap();
        store.set("user:alice", "second").await.unwrap();
        assert_eq!(store.get("user:alice").await.unwrap().as_deref(), Some("second"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_set_if_absent_keeps_first_value() {
        let store = MemoryCredentialStore::new();

        assert!(store.set_if_absent("user:alice", "first1").await.unwrap());
        assert!(!store.set_if_absent("user:alice", "second").await.unwrap());

        assert_eq!(store.get("user:alice").await.unwrap().as_deref(), Some("first1"));
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_records() {
        let store = MemoryCredentialStore::new();
        let other = store.clone();
        store.set("user:alice", "secret1").await.unwrap();
        assert!(other.exists("user:alice").await.unwrap());
    }
}
