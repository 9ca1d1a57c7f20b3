//! Lost-race simulation for conditional writes.

use std::sync::Arc;

use async_trait::async_trait;
use kscdb_kv_types::DeleteRequest;
use kscdb_kv_types::DeleteResult;
use kscdb_kv_types::KeyValueStoreError;
use kscdb_kv_types::ReadRequest;
use kscdb_kv_types::ReadResult;
use kscdb_kv_types::ScanRequest;
use kscdb_kv_types::ScanResult;
use kscdb_kv_types::WriteCommand;
use kscdb_kv_types::WriteRequest;
use kscdb_kv_types::WriteResult;
use kscdb_traits::KeyValueStore;
use parking_lot::Mutex as SyncMutex;
use tracing::debug;

type Rewrite = Box<dyn Fn(&[u8]) -> Vec<u8> + Send + Sync>;

/// Wraps a backend and lets a simulated competing writer win the next
/// `races` conditional writes under a key prefix.
///
/// Just before a `CompareAndSwap` with an expected value or a
/// `CompareAndDelete` reaches the inner store, the current record is
/// replaced by `rewrite(current)`. The caller's comparison then fails the
/// way it would against a concurrent client. Inserts (`expected: None`)
/// and unconditional writes pass through untouched.
pub struct RacingWriterStore<S> {
    inner: S,
    prefix: String,
    races: SyncMutex<u32>,
    rewrite: Rewrite,
}

impl<S: KeyValueStore> RacingWriterStore<S> {
    pub fn new<F>(inner: S, prefix: impl Into<String>, races: u32, rewrite: F) -> Arc<Self>
    where F: Fn(&[u8]) -> Vec<u8> + Send + Sync + 'static {
        Arc::new(Self {
            inner,
            prefix: prefix.into(),
            races: SyncMutex::new(races),
            rewrite: Box::new(rewrite),
        })
    }

    /// Races not yet lost by the caller.
    pub fn races_remaining(&self) -> u32 {
        *self.races.lock()
    }

    fn take_race(&self, key: &str) -> bool {
        if !key.starts_with(self.prefix.as_str()) {
            return false;
        }
        let mut races = self.races.lock();
        if *races == 0 {
            return false;
        }
        *races -= 1;
        true
    }

    async fn interfere(&self, key: &str) -> Result<(), KeyValueStoreError> {
        let Some(current) = self.inner.read(ReadRequest::new(key)).await?.kv else {
            return Ok(());
        };
        let rewritten = (self.rewrite)(&current.value);
        debug!(key, "competing writer rewrites record");
        self.inner.write(WriteRequest::set(key, rewritten)).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: KeyValueStore> KeyValueStore for RacingWriterStore<S> {
    async fn write(&self, request: WriteRequest) -> Result<WriteResult, KeyValueStoreError> {
        let conditional = match &request.command {
            WriteCommand::CompareAndSwap { expected, .. } => expected.is_some(),
            WriteCommand::CompareAndDelete { .. } => true,
            WriteCommand::Set { .. } | WriteCommand::Delete { .. } => false,
        };
        if conditional && self.take_race(request.command.key()) {
            self.interfere(request.command.key()).await?;
        }
        self.inner.write(request).await
    }

    async fn read(&self, request: ReadRequest) -> Result<ReadResult, KeyValueStoreError> {
        self.inner.read(request).await
    }

    async fn delete(&self, request: DeleteRequest) -> Result<DeleteResult, KeyValueStoreError> {
        self.inner.delete(request).await
    }

    async fn scan(&self, request: ScanRequest) -> Result<ScanResult, KeyValueStoreError> {
        self.inner.scan(request).await
    }
}
