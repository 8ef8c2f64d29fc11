//! Durable tier adapter: namespacing, serialization, and timeout bounds.
//!
//! The adapter owns everything between the cache and the raw key-value
//! store: it prefixes keys with the cache namespace, serializes entries to
//! JSON, bounds every store call with a timeout, and treats corrupt records
//! as absent (deleting them opportunistically). Callers decide what to do
//! with the remaining failures; the facade logs and degrades.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use stratum_core::{Entry, StorageError};
use tokio::time::timeout;

use crate::store::KeyValueStore;

/// Separator between the cache namespace and the logical key.
const SEPARATOR: char = ':';

/// Thin interface to the external durable key-value store.
///
/// Keys are namespaced as `"<namespace>:<key>"`, so several caches can share
/// one store without observing each other's records and `clear` can scope
/// its deletes to this cache alone.
#[derive(Debug)]
pub struct DurableTier<S> {
    store: Arc<S>,
    namespace: String,
    op_timeout: Duration,
}

impl<S> Clone for DurableTier<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            namespace: self.namespace.clone(),
            op_timeout: self.op_timeout,
        }
    }
}

impl<S: KeyValueStore> DurableTier<S> {
    /// Create a new adapter over a store.
    pub fn new(store: Arc<S>, namespace: impl Into<String>, op_timeout: Duration) -> Self {
        Self {
            store,
            namespace: namespace.into(),
            op_timeout,
        }
    }

    /// The namespace this adapter scopes its keys under.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}{}", self.namespace, SEPARATOR, key)
    }

    fn key_prefix(&self) -> String {
        format!("{}{}", self.namespace, SEPARATOR)
    }

    /// Read and deserialize the entry stored under `key`.
    ///
    /// A record that fails to deserialize is treated identically to absence:
    /// it is logged, deleted best-effort, and `Ok(None)` is returned. I/O
    /// errors and timeouts surface as `Err` for the caller to log and treat
    /// as a miss.
    pub async fn read<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<Entry<T>>, StorageError> {
        let namespaced = self.namespaced(key);
        let bytes = match timeout(self.op_timeout, self.store.get(&namespaced)).await {
            Err(_) => {
                return Err(StorageError::Timeout {
                    operation: "read",
                    timeout: self.op_timeout,
                })
            }
            Ok(Err(e)) => return Err(e),
            Ok(Ok(None)) => return Ok(None),
            Ok(Ok(Some(bytes))) => bytes,
        };

        match serde_json::from_slice::<Entry<T>>(&bytes) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) => {
                tracing::warn!(key, error = %e, "Corrupt durable record, treating as absent");
                if let Err(del_err) = self.delete(key).await {
                    tracing::warn!(key, error = %del_err, "Failed to delete corrupt record");
                }
                Ok(None)
            }
        }
    }

    /// Serialize and write an entry under `key`.
    pub async fn write<T: Serialize>(
        &self,
        key: &str,
        entry: &Entry<T>,
    ) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(entry).map_err(|e| StorageError::Serialization {
            reason: e.to_string(),
        })?;
        let namespaced = self.namespaced(key);

        match timeout(self.op_timeout, self.store.put(&namespaced, &bytes)).await {
            Err(_) => Err(StorageError::Timeout {
                operation: "write",
                timeout: self.op_timeout,
            }),
            Ok(result) => result,
        }
    }

    /// Delete the record under `key`. Deleting an absent key is a no-op.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let namespaced = self.namespaced(key);
        match timeout(self.op_timeout, self.store.delete(&namespaced)).await {
            Err(_) => Err(StorageError::Timeout {
                operation: "delete",
                timeout: self.op_timeout,
            }),
            Ok(result) => result,
        }
    }

    /// List the logical keys (namespace prefix stripped) stored under this
    /// cache's namespace.
    pub async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let prefix = self.key_prefix();
        let raw = match timeout(self.op_timeout, self.store.keys_with_prefix(&prefix)).await {
            Err(_) => {
                return Err(StorageError::Timeout {
                    operation: "list",
                    timeout: self.op_timeout,
                })
            }
            Ok(result) => result?,
        };

        Ok(raw
            .iter()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }

    /// Delete every record under this cache's namespace.
    ///
    /// Best-effort: individual failures are logged and skipped. Returns the
    /// number of records deleted.
    pub async fn clear(&self) -> u64 {
        let keys = match self.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list durable keys for clear");
                return 0;
            }
        };

        let mut deleted = 0u64;
        for key in &keys {
            match self.delete(key).await {
                Ok(()) => deleted += 1,
                Err(e) => tracing::warn!(key = %key, error = %e, "Durable delete failed during clear"),
            }
        }

        deleted
    }
}
