//! Plain key-value access through the facade.

use std::sync::Arc;

use kscdb_kv_types::KeyList;
use kscdb_kv_types::KeyValueStoreError;
use kscdb_traits::KeyOrderedStore;
use kscdb_traits::KeyValueStore;
use tracing::debug;

/// Unconditional get/set/delete and prefix listing over the backend.
///
/// Keys written here share the keyspace with lock records, so a lock key and
/// a map key with the same name are the same record.
pub struct KeyValueMap<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
}

impl<S: KeyValueStore + ?Sized> Clone for KeyValueMap<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: KeyValueStore + ?Sized + 'static> KeyValueMap<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn set(&self, key: &str, value: impl Into<Vec<u8>>) -> Result<(), KeyValueStoreError> {
        self.store.set(key, value.into()).await
    }

    /// Current value, or `None` if the key is absent.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyValueStoreError> {
        self.store.get(key).await
    }

    /// Returns true if a value was removed.
    pub async fn delete(&self, key: &str) -> Result<bool, KeyValueStoreError> {
        self.store.delete_key(key).await
    }

    /// Keys starting with `prefix`, in key order.
    pub async fn list(&self, prefix: &str) -> Result<KeyList, KeyValueStoreError> {
        let entries = self.store.range_scan(prefix).await?;
        debug!(prefix, count = entries.len(), "listed keys");
        Ok(entries.into_iter().map(|entry| entry.key).collect())
    }

    /// Values of the keys starting with `prefix`, in key order.
    pub async fn list_body(&self, prefix: &str) -> Result<Vec<Vec<u8>>, KeyValueStoreError> {
        let entries = self.store.range_scan(prefix).await?;
        Ok(entries.into_iter().map(|entry| entry.value).collect())
    }
}
