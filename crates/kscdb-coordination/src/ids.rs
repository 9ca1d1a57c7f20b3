//! Lock-protected monotonically increasing ID allocator.
//!
//! Each counter is a record holding the decimal text of the next ID to hand
//! out. Allocation takes the counter's lock, reads the value, writes the
//! successor and returns the value read. The lock serializes every writer,
//! so the successor is written with a plain set.
//!
//! IDs from one counter are unique and strictly increasing across all
//! clients. Gaps are possible when a client fails between writing the
//! successor and receiving the reply.

use std::sync::Arc;

use kscdb_constants::coordination::DEFAULT_COUNTER_START_VALUE;
use kscdb_traits::KeyOrderedStore;
use kscdb_traits::KeyValueStore;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::error::CoordinationError;
use crate::error::CorruptedDataSnafu;
use crate::error::SequenceExhaustedSnafu;
use crate::lock::DistributedLock;
use crate::lock::LockConfig;
use crate::lock::finish_locked;
use crate::verified::compute_next_id;
use crate::verified::counter_key;
use crate::verified::counter_lock_key;
use crate::verified::encode_counter;
use crate::verified::parse_counter;

/// Configuration for [`IdAllocator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdConfig {
    /// First ID handed out by a counter that does not exist yet.
    pub start_value: u64,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            start_value: DEFAULT_COUNTER_START_VALUE,
        }
    }
}

/// Named counters handing out unique increasing IDs.
pub struct IdAllocator<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    lock: DistributedLock<S>,
    config: IdConfig,
}

impl<S: KeyValueStore + ?Sized + 'static> IdAllocator<S> {
    pub fn new(store: Arc<S>, lock_config: LockConfig, config: IdConfig) -> Self {
        Self {
            lock: DistributedLock::new(Arc::clone(&store), lock_config),
            store,
            config,
        }
    }

    /// Allocate the next ID from counter `name`.
    pub async fn next(&self, name: &str) -> Result<u64, CoordinationError> {
        let lock_key = counter_lock_key(name);
        let token = self.lock.acquire(&lock_key).await?;
        let result = self.allocate(name).await;
        let release = self.lock.release(&lock_key, &token).await;
        finish_locked(&lock_key, result, release)
    }

    /// Overwrite the next ID counter `name` will hand out.
    pub async fn set(&self, name: &str, next_id: u64) -> Result<(), CoordinationError> {
        let lock_key = counter_lock_key(name);
        let token = self.lock.acquire(&lock_key).await?;
        let result = self
            .store
            .set(&counter_key(name), encode_counter(next_id))
            .await
            .map_err(CoordinationError::from);
        let release = self.lock.release(&lock_key, &token).await;
        finish_locked(&lock_key, result, release)?;
        info!(name, next_id, "counter set");
        Ok(())
    }

    /// The ID the next call to [`next`](Self::next) would return, without
    /// allocating it. Absent counters report the start value.
    pub async fn current(&self, name: &str) -> Result<u64, CoordinationError> {
        let key = counter_key(name);
        match self.store.get(&key).await? {
            Some(bytes) => self.decode(&key, &bytes),
            None => Ok(self.config.start_value),
        }
    }

    /// Remove counter `name`. The next allocation restarts at the start value.
    pub async fn delete(&self, name: &str) -> Result<bool, CoordinationError> {
        let removed = self.store.delete_key(&counter_key(name)).await?;
        info!(name, removed, "counter deleted");
        Ok(removed)
    }

    async fn allocate(&self, name: &str) -> Result<u64, CoordinationError> {
        let key = counter_key(name);
        let current = match self.store.get(&key).await? {
            Some(bytes) => self.decode(&key, &bytes)?,
            None => self.initialize(&key).await?,
        };

        let Some(next) = compute_next_id(current) else {
            return SequenceExhaustedSnafu { key }.fail();
        };
        self.store.set(&key, encode_counter(next)).await?;
        debug!(name, id = current, "id allocated");
        Ok(current)
    }

    /// Create a missing counter at the start value and return that value.
    async fn initialize(&self, key: &str) -> Result<u64, CoordinationError> {
        let start = self.config.start_value;
        if self.store.cas_insert(key, encode_counter(start)).await? {
            return Ok(start);
        }
        // Written concurrently by a writer that bypassed the lock; take its value.
        match self.store.get(key).await? {
            Some(bytes) => self.decode(key, &bytes),
            None => Ok(start),
        }
    }

    fn decode(&self, key: &str, bytes: &[u8]) -> Result<u64, CoordinationError> {
        parse_counter(bytes).map_err(|reason| CorruptedDataSnafu { key, reason }.build())
    }
}

#[cfg(test)]
mod tests {
    use kscdb_testing::DeterministicKeyValueStore;
    use kscdb_testing::FaultInjectingStore;

    use super::*;
    use crate::lock::BackoffPolicy;

    fn lock_config() -> LockConfig {
        LockConfig {
            backoff: BackoffPolicy {
                initial_backoff_ms: 1,
                max_backoff_ms: 4,
            },
            ..LockConfig::default()
        }
    }

    fn allocator<S: KeyValueStore + 'static>(store: Arc<S>) -> IdAllocator<S> {
        crate::test_support::init_tracing();
        IdAllocator::new(store, lock_config(), IdConfig::default())
    }

    #[tokio::test]
    async fn fresh_counter_starts_at_one() {
        let store = DeterministicKeyValueStore::new();
        let ids = allocator(store.clone());

        assert_eq!(ids.next("orders").await.unwrap(), 1);
        assert_eq!(ids.next("orders").await.unwrap(), 2);
        assert_eq!(store.get("__ids:orders").await.unwrap(), Some(b"3".to_vec()));
        // Lock released after each allocation.
        assert_eq!(store.get("orders/lock").await.unwrap(), None);
    }

    #[tokio::test]
    async fn counters_are_independent() {
        let ids = allocator(DeterministicKeyValueStore::new());
        assert_eq!(ids.next("a").await.unwrap(), 1);
        assert_eq!(ids.next("a").await.unwrap(), 2);
        assert_eq!(ids.next("b").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_restarts_counter() {
        let ids = allocator(DeterministicKeyValueStore::new());
        ids.next("orders").await.unwrap();
        ids.next("orders").await.unwrap();
        assert!(ids.delete("orders").await.unwrap());
        assert!(!ids.delete("orders").await.unwrap());
        assert_eq!(ids.next("orders").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn set_and_current() {
        let ids = allocator(DeterministicKeyValueStore::new());
        assert_eq!(ids.current("orders").await.unwrap(), 1);
        ids.set("orders", 100).await.unwrap();
        assert_eq!(ids.current("orders").await.unwrap(), 100);
        assert_eq!(ids.next("orders").await.unwrap(), 100);
        assert_eq!(ids.current("orders").await.unwrap(), 101);
    }

    #[tokio::test]
    async fn custom_start_value() {
        let ids = IdAllocator::new(DeterministicKeyValueStore::new(), lock_config(), IdConfig { start_value: 1_000 });
        assert_eq!(ids.next("x").await.unwrap(), 1_000);
        assert_eq!(ids.next("x").await.unwrap(), 1_001);
    }

    #[tokio::test]
    async fn exhausted_counter_errors_and_releases_lock() {
        let store = DeterministicKeyValueStore::new();
        let ids = allocator(store.clone());
        ids.set("max", u64::MAX).await.unwrap();

        let err = ids.next("max").await.unwrap_err();
        assert!(matches!(err, CoordinationError::SequenceExhausted { .. }));
        assert_eq!(store.get("max/lock").await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupted_counter_is_reported() {
        let store = DeterministicKeyValueStore::new();
        store.set("__ids:bad", b"not-a-number".to_vec()).await.unwrap();
        let ids = allocator(store.clone());

        let err = ids.next("bad").await.unwrap_err();
        assert!(matches!(err, CoordinationError::CorruptedData { ref key, .. } if key == "__ids:bad"));
        assert_eq!(store.get("bad/lock").await.unwrap(), None);
    }

    #[tokio::test]
    async fn lock_released_when_counter_write_fails() {
        let inner = DeterministicKeyValueStore::new();
        let store = FaultInjectingStore::new(inner.clone());
        store.fail_writes_with_prefix("__ids:");
        let ids = allocator(store.clone());

        let err = ids.next("orders").await.unwrap_err();
        assert!(err.is_storage());
        assert!(store.injected_count() >= 1);
        assert_eq!(inner.get("orders/lock").await.unwrap(), None);

        store.clear();
        assert_eq!(ids.next("orders").await.unwrap(), 1);
    }
}
