//! Token-based distributed lock on a compare-and-swap insert.
//!
//! The lock record lives at a caller-chosen key. Acquisition inserts a fresh
//! token if the key is absent and then reads the key back: whoever's token is
//! stored holds the lock. Release deletes the record only if it still carries
//! the caller's token.
//!
//! Optional leases append a deadline to the record; an expired record can be
//! taken over with a compare-and-swap against the exact stored bytes.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use kscdb_constants::coordination::LOCK_INITIAL_BACKOFF_MS;
use kscdb_constants::coordination::LOCK_MAX_BACKOFF_MS;
use kscdb_constants::coordination::LOCK_MAX_RELEASE_ATTEMPTS;
use kscdb_traits::KeyOrderedStore;
use kscdb_traits::KeyValueStore;
use rand::Rng;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::error::CoordinationError;
use crate::error::LockNotHeldSnafu;
use crate::error::MaxRetriesExceededSnafu;
use crate::error::TimeoutSnafu;
use crate::error::TokenMismatchSnafu;
use crate::types::LockRecord;
use crate::types::LockToken;
use crate::types::now_unix_ms;
use crate::verified::BackoffStep;
use crate::verified::compute_backoff_step;
use crate::verified::compute_lease_deadline;
use crate::verified::encode_lock_record;
use crate::verified::parse_lock_record;

/// Delay schedule between contended acquisition attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Initial backoff for retry in milliseconds.
    pub initial_backoff_ms: u64,
    /// Maximum backoff between retries in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_backoff_ms: LOCK_INITIAL_BACKOFF_MS,
            max_backoff_ms: LOCK_MAX_BACKOFF_MS,
        }
    }
}

impl BackoffPolicy {
    /// Next step from `current_ms`, drawing jitter from the thread RNG.
    pub fn step(&self, current_ms: u64) -> BackoffStep {
        // Create rng here to avoid holding non-Send type across await
        let seed: u64 = rand::rng().random();
        compute_backoff_step(current_ms, self.max_backoff_ms, seed)
    }
}

/// Configuration for [`DistributedLock`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub backoff: BackoffPolicy,
    /// Give up acquisition after this long. `None` retries forever.
    pub acquire_timeout_ms: Option<u64>,
    /// Lease length written into each record. `None` means records never expire.
    pub lease_ttl_ms: Option<u64>,
}

enum Attempt {
    Acquired,
    Held(LockRecord),
    /// The read after our insert saw no record (lagging read or a concurrent release).
    Vanished,
}

/// A distributed mutex keyed by lock name.
///
/// One handle serves any number of lock keys; each acquisition returns the
/// [`LockToken`] needed to release it.
pub struct DistributedLock<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    config: LockConfig,
}

impl<S: KeyValueStore + ?Sized> Clone for DistributedLock<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: KeyValueStore + ?Sized + 'static> DistributedLock<S> {
    pub fn new(store: Arc<S>, config: LockConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Acquire the lock at `key`, waiting as long as necessary.
    ///
    /// Contention never produces an error; only backend failures or an
    /// elapsed `acquire_timeout_ms` do.
    pub async fn acquire(&self, key: &str) -> Result<LockToken, CoordinationError> {
        let token = LockToken::generate();
        let started = Instant::now();
        let mut backoff_ms = self.config.backoff.initial_backoff_ms;
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            let holder = match self.attempt(key, &token).await? {
                Attempt::Acquired => {
                    debug!(key, token = %token, attempts, "lock acquired");
                    return Ok(token);
                }
                Attempt::Held(record) => Some(record.token),
                Attempt::Vanished => None,
            };

            let mut sleep_ms = {
                let step = self.config.backoff.step(backoff_ms);
                backoff_ms = step.next_backoff_ms;
                step.sleep_ms
            };

            if let Some(timeout_ms) = self.config.acquire_timeout_ms {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                if elapsed_ms >= timeout_ms {
                    return TimeoutSnafu {
                        operation: format!("lock acquisition for '{key}' after {attempts} attempts"),
                    }
                    .fail();
                }
                sleep_ms = sleep_ms.min(timeout_ms - elapsed_ms);
            }

            debug!(key, holder = ?holder, attempts, backoff_ms = sleep_ms, "lock held, backing off");
            tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
        }
    }

    /// One insert-then-read round. `None` if someone else holds the lock.
    pub async fn try_acquire(&self, key: &str) -> Result<Option<LockToken>, CoordinationError> {
        let token = LockToken::generate();
        match self.attempt(key, &token).await? {
            Attempt::Acquired => {
                debug!(key, token = %token, "lock acquired");
                Ok(Some(token))
            }
            Attempt::Held(_) | Attempt::Vanished => Ok(None),
        }
    }

    /// Release the lock at `key` held by `token`.
    ///
    /// Fails with `LockNotHeld` if there is no record and `TokenMismatch` if
    /// another token holds it; in both cases the record is left untouched.
    pub async fn release(&self, key: &str, token: &LockToken) -> Result<(), CoordinationError> {
        for attempt in 1..=LOCK_MAX_RELEASE_ATTEMPTS {
            let Some(observed) = self.store.get(key).await? else {
                return LockNotHeldSnafu { key }.fail();
            };
            let record = parse_lock_record(&observed);
            if !record.is_held_by(token) {
                return TokenMismatchSnafu {
                    key,
                    holder: record.token,
                }
                .fail();
            }
            if self.store.cas_delete(key, &observed).await? {
                debug!(key, token = %token, "lock released");
                return Ok(());
            }
            debug!(key, attempt, "lock record changed during release, re-reading");
        }
        MaxRetriesExceededSnafu {
            operation: format!("lock release for '{key}'"),
            attempts: LOCK_MAX_RELEASE_ATTEMPTS,
        }
        .fail()
    }

    /// Current holder of `key`, if any.
    pub async fn holder(&self, key: &str) -> Result<Option<LockRecord>, CoordinationError> {
        Ok(self.store.get(key).await?.map(|bytes| parse_lock_record(&bytes)))
    }

    fn record_for(&self, token: &LockToken) -> Vec<u8> {
        let deadline = self.config.lease_ttl_ms.map(|ttl| compute_lease_deadline(now_unix_ms(), ttl));
        encode_lock_record(token.as_str(), deadline)
    }

    async fn attempt(&self, key: &str, token: &LockToken) -> Result<Attempt, CoordinationError> {
        // The insert outcome is not trusted on its own: an ambiguous failure may
        // have landed, so ownership is decided by reading the key back.
        self.store.cas_insert(key, self.record_for(token)).await?;

        let Some(observed) = self.store.get(key).await? else {
            return Ok(Attempt::Vanished);
        };
        let record = parse_lock_record(&observed);
        if record.is_held_by(token) {
            return Ok(Attempt::Acquired);
        }

        if self.config.lease_ttl_ms.is_some() && record.is_expired(now_unix_ms()) {
            if self.store.cas_update(key, &observed, self.record_for(token)).await? {
                warn!(key, previous = %record.token, "took over expired lock");
                return Ok(Attempt::Acquired);
            }
            debug!(key, "expired lock changed before takeover");
        }
        Ok(Attempt::Held(record))
    }
}

/// Combine the outcome of a locked section with the outcome of releasing the
/// lock. A release failure is reported only when the body succeeded.
pub(crate) fn finish_locked<T>(
    key: &str,
    body: Result<T, CoordinationError>,
    release: Result<(), CoordinationError>,
) -> Result<T, CoordinationError> {
    match (body, release) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(release_err)) => Err(release_err),
        (Err(body_err), Ok(())) => Err(body_err),
        (Err(body_err), Err(release_err)) => {
            warn!(key, error = %release_err, "lock release failed after error");
            Err(body_err)
        }
    }
}

#[cfg(test)]
mod tests {
    use kscdb_testing::DeterministicKeyValueStore;
    use kscdb_testing::FaultInjectingStore;
    use kscdb_testing::RacingWriterStore;
    use kscdb_testing::StaleReadStore;
    use kscdb_testing::StoreOperation;

    use super::*;

    fn fast_config() -> LockConfig {
        crate::test_support::init_tracing();
        LockConfig {
            backoff: BackoffPolicy {
                initial_backoff_ms: 1,
                max_backoff_ms: 5,
            },
            ..LockConfig::default()
        }
    }

    #[tokio::test]
    async fn acquire_writes_token_record() {
        let store = DeterministicKeyValueStore::new();
        let lock = DistributedLock::new(store.clone(), fast_config());

        let token = lock.acquire("res").await.unwrap();
        assert_eq!(store.get("res").await.unwrap(), Some(token.as_str().as_bytes().to_vec()));
        let holder = lock.holder("res").await.unwrap().unwrap();
        assert!(holder.is_held_by(&token));
    }

    #[tokio::test]
    async fn try_acquire_fails_while_held() {
        let store = DeterministicKeyValueStore::new();
        let lock = DistributedLock::new(store, fast_config());

        let token = lock.try_acquire("res").await.unwrap().unwrap();
        assert!(lock.try_acquire("res").await.unwrap().is_none());

        lock.release("res", &token).await.unwrap();
        assert!(lock.try_acquire("res").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn release_with_wrong_token_leaves_lock() {
        let store = DeterministicKeyValueStore::new();
        let lock = DistributedLock::new(store, fast_config());

        let token = lock.acquire("res").await.unwrap();
        let err = lock.release("res", &LockToken::generate()).await.unwrap_err();
        assert!(matches!(err, CoordinationError::TokenMismatch { ref holder, .. } if holder == token.as_str()));
        assert!(lock.holder("res").await.unwrap().is_some());

        lock.release("res", &token).await.unwrap();
        assert!(lock.holder("res").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn release_absent_lock_is_not_held() {
        let lock = DistributedLock::new(DeterministicKeyValueStore::new(), fast_config());
        let err = lock.release("res", &LockToken::generate()).await.unwrap_err();
        assert!(matches!(err, CoordinationError::LockNotHeld { .. }));
    }

    #[tokio::test]
    async fn double_release_reports_not_held() {
        let lock = DistributedLock::new(DeterministicKeyValueStore::new(), fast_config());
        let token = lock.acquire("res").await.unwrap();
        lock.release("res", &token).await.unwrap();
        let err = lock.release("res", &token).await.unwrap_err();
        assert!(matches!(err, CoordinationError::LockNotHeld { .. }));
    }

    #[tokio::test]
    async fn timeout_when_contended() {
        let store = DeterministicKeyValueStore::new();
        let holder = DistributedLock::new(store.clone(), fast_config());
        let _token = holder.acquire("res").await.unwrap();

        let waiter = DistributedLock::new(store, LockConfig {
            acquire_timeout_ms: Some(30),
            ..fast_config()
        });
        let err = waiter.acquire("res").await.unwrap_err();
        assert!(matches!(err, CoordinationError::Timeout { .. }));
    }

    #[tokio::test]
    async fn waiter_acquires_after_release() {
        let store = DeterministicKeyValueStore::new();
        let lock = DistributedLock::new(store, fast_config());
        let token = lock.acquire("res").await.unwrap();

        let waiter = lock.clone();
        let handle = tokio::spawn(async move { waiter.acquire("res").await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        lock.release("res", &token).await.unwrap();

        let second = handle.await.unwrap().unwrap();
        assert_ne!(second, token);
        assert!(lock.holder("res").await.unwrap().unwrap().is_held_by(&second));
    }

    #[tokio::test]
    async fn stale_read_still_converges() {
        let store = StaleReadStore::new(DeterministicKeyValueStore::new(), 3);
        let lock = DistributedLock::new(store.clone(), fast_config());

        let token = lock.acquire("res").await.unwrap();
        assert_eq!(store.remaining(), 0);
        assert!(lock.holder("res").await.unwrap().unwrap().is_held_by(&token));
    }

    #[tokio::test]
    async fn backend_failure_aborts_acquire() {
        let store = FaultInjectingStore::new(DeterministicKeyValueStore::new());
        store.fail_all(StoreOperation::Write);
        let lock = DistributedLock::new(store, fast_config());

        let err = lock.acquire("res").await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn expired_lease_is_taken_over() {
        let store = DeterministicKeyValueStore::new();
        let stale_deadline = now_unix_ms().saturating_sub(1_000);
        store.set("res", encode_lock_record("crashed-holder", Some(stale_deadline))).await.unwrap();

        let lock = DistributedLock::new(store, LockConfig {
            lease_ttl_ms: Some(60_000),
            acquire_timeout_ms: Some(1_000),
            ..fast_config()
        });
        let token = lock.acquire("res").await.unwrap();
        let holder = lock.holder("res").await.unwrap().unwrap();
        assert!(holder.is_held_by(&token));
        assert!(holder.lease_deadline_ms.is_some());
    }

    #[tokio::test]
    async fn live_lease_is_respected() {
        let store = DeterministicKeyValueStore::new();
        let deadline = now_unix_ms() + 60_000;
        store.set("res", encode_lock_record("live-holder", Some(deadline))).await.unwrap();

        let lock = DistributedLock::new(store, LockConfig {
            lease_ttl_ms: Some(60_000),
            ..fast_config()
        });
        assert!(lock.try_acquire("res").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn records_without_lease_never_expire() {
        let store = DeterministicKeyValueStore::new();
        store.set("res", b"forever".to_vec()).await.unwrap();

        let lock = DistributedLock::new(store, LockConfig {
            lease_ttl_ms: Some(1),
            ..fast_config()
        });
        assert!(lock.try_acquire("res").await.unwrap().is_none());
    }

    /// Rewrites a lock record so it keeps the same token but a different
    /// lease suffix, as a holder refreshing its lease would.
    fn extend_lease_suffix(value: &[u8]) -> Vec<u8> {
        let mut value = value.to_vec();
        if !value.contains(&b'@') {
            value.push(b'@');
        }
        value.push(b'1');
        value
    }

    #[tokio::test]
    async fn release_rereads_after_losing_delete() {
        let store = RacingWriterStore::new(DeterministicKeyValueStore::new(), "res", 2, extend_lease_suffix);
        let lock = DistributedLock::new(store.clone(), fast_config());
        let token = lock.acquire("res").await.unwrap();

        lock.release("res", &token).await.unwrap();
        assert_eq!(store.races_remaining(), 0);
        assert!(lock.holder("res").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn release_gives_up_after_bounded_rounds() {
        let races = LOCK_MAX_RELEASE_ATTEMPTS + 1;
        let store = RacingWriterStore::new(DeterministicKeyValueStore::new(), "res", races, extend_lease_suffix);
        let lock = DistributedLock::new(store.clone(), fast_config());
        let token = lock.acquire("res").await.unwrap();

        let err = lock.release("res", &token).await.unwrap_err();
        assert!(matches!(
            err,
            CoordinationError::MaxRetriesExceeded { attempts, .. } if attempts == LOCK_MAX_RELEASE_ATTEMPTS
        ));
        assert_eq!(store.races_remaining(), 1);
        assert!(lock.holder("res").await.unwrap().unwrap().is_held_by(&token));
    }

    #[tokio::test]
    async fn zero_backoff_does_not_spin() {
        let store = DeterministicKeyValueStore::new();
        let holder = DistributedLock::new(store.clone(), fast_config());
        let _token = holder.acquire("res").await.unwrap();

        let waiter = DistributedLock::new(store, LockConfig {
            backoff: BackoffPolicy {
                initial_backoff_ms: 0,
                max_backoff_ms: 0,
            },
            acquire_timeout_ms: Some(20),
            lease_ttl_ms: None,
        });
        let operation = match waiter.acquire("res").await.unwrap_err() {
            CoordinationError::Timeout { operation } => operation,
            other => panic!("expected timeout, got {other:?}"),
        };
        let attempts: u32 = operation
            .split_whitespace()
            .rev()
            .nth(1)
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert!(attempts <= 40, "{attempts} attempts in 20ms");
    }

    #[test]
    fn finish_locked_prefers_body_error() {
        let body: Result<(), _> = Err(CoordinationError::EmptyQueue { name: "q".into() });
        let release = Err(CoordinationError::LockNotHeld { key: "q".into() });
        assert!(finish_locked("q", body, release).unwrap_err().is_empty_queue());

        let release_only = finish_locked("q", Ok(5), Err(CoordinationError::LockNotHeld { key: "q".into() }));
        assert!(matches!(release_only, Err(CoordinationError::LockNotHeld { .. })));
    }
}
