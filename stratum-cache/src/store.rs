//! Key-value store boundary for the durable tier.
//!
//! The cache consumes persistent storage through this trait and nothing
//! else: string keys, opaque byte values, prefix listing. Serialization and
//! namespacing live one layer up, in [`crate::durable::DurableTier`].

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use stratum_core::StorageError;

/// Generic persistent key-value store.
///
/// All operations are fallible due to external I/O. Implementations must be
/// thread-safe and support concurrent access; they do not interpret values.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Insert or overwrite the value stored under `key`.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Delete the value stored under `key`. Deleting an absent key is a no-op.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List every key starting with `prefix`.
    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// In-memory store: a HashMap behind a RwLock.
///
/// Useful for tests and for deployments that want the two-tier semantics
/// without persistence across restarts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    /// True when no values are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let values = self.values.read().map_err(|_| StorageError::ReadFailed {
            reason: "store lock poisoned".to_string(),
        })?;
        Ok(values.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut values = self.values.write().map_err(|_| StorageError::WriteFailed {
            reason: "store lock poisoned".to_string(),
        })?;
        values.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.write().map_err(|_| StorageError::WriteFailed {
            reason: "store lock poisoned".to_string(),
        })?;
        values.remove(key);
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let values = self.values.read().map_err(|_| StorageError::ReadFailed {
            reason: "store lock poisoned".to_string(),
        })?;
        Ok(values
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_delete() {
        let store = MemoryStore::new();

        store.put("a", b"1").await.expect("put should succeed");
        assert_eq!(
            store.get("a").await.expect("get should succeed"),
            Some(b"1".to_vec())
        );

        store.delete("a").await.expect("delete should succeed");
        assert_eq!(store.get("a").await.expect("get should succeed"), None);
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_noop() {
        let store = MemoryStore::new();
        store
            .delete("missing")
            .await
            .expect("delete should succeed");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_keys_with_prefix() {
        let store = MemoryStore::new();
        store.put("cache:a", b"1").await.expect("put should succeed");
        store.put("cache:b", b"2").await.expect("put should succeed");
        store.put("other:c", b"3").await.expect("put should succeed");

        let mut keys = store
            .keys_with_prefix("cache:")
            .await
            .expect("listing should succeed");
        keys.sort();
        assert_eq!(keys, vec!["cache:a".to_string(), "cache:b".to_string()]);
    }

    #[tokio::test]
    async fn test_overwrite() {
        let store = MemoryStore::new();
        store.put("a", b"1").await.expect("put should succeed");
        store.put("a", b"2").await.expect("put should succeed");
        assert_eq!(
            store.get("a").await.expect("get should succeed"),
            Some(b"2".to_vec())
        );
        assert_eq!(store.len(), 1);
    }
}
