//! Lagging-replica simulation.

use std::sync::Arc;
use std::sync::atomic::AtomicU32;
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
use tracing::trace;

/// Wraps a backend and reports the next `n` point reads as absent, whatever
/// the underlying value. Writes, deletes and scans pass through.
pub struct StaleReadStore<S> {
    inner: S,
    stale_reads: AtomicU32,
}

impl<S: KeyValueStore> StaleReadStore<S> {
    pub fn new(inner: S, stale_reads: u32) -> Arc<Self> {
        Arc::new(Self {
            inner,
            stale_reads: AtomicU32::new(stale_reads),
        })
    }

    /// Queue `n` more stale reads.
    pub fn add_stale_reads(&self, n: u32) {
        self.stale_reads.fetch_add(n, Ordering::SeqCst);
    }

    /// Stale reads not yet served.
    pub fn remaining(&self) -> u32 {
        self.stale_reads.load(Ordering::SeqCst)
    }

    fn take_stale(&self) -> bool {
        self.stale_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl<S: KeyValueStore> KeyValueStore for StaleReadStore<S> {
    async fn write(&self, request: WriteRequest) -> Result<WriteResult, KeyValueStoreError> {
        self.inner.write(request).await
    }

    async fn read(&self, request: ReadRequest) -> Result<ReadResult, KeyValueStoreError> {
        if self.take_stale() {
            trace!(key = %request.key, "serving stale read");
            return Ok(ReadResult { kv: None });
        }
        self.inner.read(request).await
    }

    async fn delete(&self, request: DeleteRequest) -> Result<DeleteResult, KeyValueStoreError> {
        self.inner.delete(request).await
    }

    async fn scan(&self, request: ScanRequest) -> Result<ScanResult, KeyValueStoreError> {
        self.inner.scan(request).await
    }
}
