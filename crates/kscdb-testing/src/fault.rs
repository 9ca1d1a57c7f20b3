//! Fault injection for backend failure tests.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use kscdb_kv_types::DeleteRequest;
use kscdb_kv_types::DeleteResult;
use kscdb_kv_types::KeyValueStoreError;
use kscdb_kv_types::ReadRequest;
use kscdb_kv_types::ReadResult;
use kscdb_kv_types::ScanRequest;
use kscdb_kv_types::ScanResult;
use kscdb_kv_types::WriteRequest;
use kscdb_kv_types::WriteResult;
use kscdb_traits::KeyValueStore;
use parking_lot::Mutex as SyncMutex;
use tracing::debug;

/// Backend operation a fault can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Read,
    Write,
    Delete,
    Scan,
}

#[derive(Default)]
struct FaultPlan {
    /// Operations that always fail.
    always: HashSet<StoreOperation>,
    /// Operations that fail for the next N calls.
    remaining: HashMap<StoreOperation, u32>,
    /// Writes and deletes to keys under these prefixes fail.
    key_prefixes: Vec<String>,
}

/// Wraps a backend and fails selected operations with
/// `KeyValueStoreError::Failed` before they reach it.
pub struct FaultInjectingStore<S> {
    inner: S,
    plan: SyncMutex<FaultPlan>,
    injected: AtomicU64,
}

impl<S: KeyValueStore> FaultInjectingStore<S> {
    /// Wrap `inner` with no faults configured.
    pub fn new(inner: S) -> Arc<Self> {
        Arc::new(Self {
            inner,
            plan: SyncMutex::new(FaultPlan::default()),
            injected: AtomicU64::new(0),
        })
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Fail every call of `op` until [`clear`](Self::clear).
    pub fn fail_all(&self, op: StoreOperation) {
        self.plan.lock().always.insert(op);
    }

    /// Fail the next `count` calls of `op`, then pass through.
    pub fn fail_next(&self, op: StoreOperation, count: u32) {
        self.plan.lock().remaining.insert(op, count);
    }

    /// Fail writes and deletes to any key starting with `prefix`.
    pub fn fail_writes_with_prefix(&self, prefix: impl Into<String>) {
        self.plan.lock().key_prefixes.push(prefix.into());
    }

    /// Remove every configured fault.
    pub fn clear(&self) {
        *self.plan.lock() = FaultPlan::default();
    }

    /// Number of calls failed so far.
    pub fn injected_count(&self) -> u64 {
        self.injected.load(Ordering::Relaxed)
    }

    fn check(&self, op: StoreOperation, key: Option<&str>) -> Result<(), KeyValueStoreError> {
        let mut plan = self.plan.lock();
        let mut should_fail = plan.always.contains(&op);
        if !should_fail
            && let Some(left) = plan.remaining.get_mut(&op)
            && *left > 0
        {
            *left -= 1;
            should_fail = true;
        }
        if !should_fail
            && matches!(op, StoreOperation::Write | StoreOperation::Delete)
            && let Some(key) = key
        {
            should_fail = plan.key_prefixes.iter().any(|p| key.starts_with(p.as_str()));
        }
        drop(plan);

        if should_fail {
            self.injected.fetch_add(1, Ordering::Relaxed);
            debug!(?op, key = key.unwrap_or(""), "injecting backend fault");
            return Err(KeyValueStoreError::failed(format!("injected {op:?} fault")));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: KeyValueStore> KeyValueStore for FaultInjectingStore<S> {
    async fn write(&self, request: WriteRequest) -> Result<WriteResult, KeyValueStoreError> {
        self.check(StoreOperation::Write, Some(request.command.key()))?;
        self.inner.write(request).await
    }

    async fn read(&self, request: ReadRequest) -> Result<ReadResult, KeyValueStoreError> {
        self.check(StoreOperation::Read, Some(&request.key))?;
        self.inner.read(request).await
    }

    async fn delete(&self, request: DeleteRequest) -> Result<DeleteResult, KeyValueStoreError> {
        self.check(StoreOperation::Delete, Some(&request.key))?;
        self.inner.delete(request).await
    }

    async fn scan(&self, request: ScanRequest) -> Result<ScanResult, KeyValueStoreError> {
        self.check(StoreOperation::Scan, None)?;
        self.inner.scan(request).await
    }
}
