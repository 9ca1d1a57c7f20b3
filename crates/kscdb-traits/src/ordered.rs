//! Compare-and-swap vocabulary over any [`KeyValueStore`].

use async_trait::async_trait;
use kscdb_kv_types::DeleteRequest;
use kscdb_kv_types::KeyValueEntry;
use kscdb_kv_types::KeyValueStoreError;
use kscdb_kv_types::ReadRequest;
use kscdb_kv_types::ScanRequest;
use kscdb_kv_types::ScanResult;
use kscdb_kv_types::WriteRequest;
use kscdb_kv_types::scan::encode_continuation_token;
use tracing::trace;

use crate::KeyValueStore;

/// Ordered-store operations used by the coordination primitives.
///
/// Conditional writes return `Ok(false)` when the condition did not hold and
/// reserve `Err` for backend failures. Every operation is safe to retry after
/// an ambiguous failure: a retried insert or update simply reports `false`
/// if the first attempt landed.
#[async_trait]
pub trait KeyOrderedStore: KeyValueStore {
    /// Current value of `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyValueStoreError>;

    /// Unconditionally store `value` under `key`.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), KeyValueStoreError>;

    /// Store `value` only if `key` is absent.
    async fn cas_insert(&self, key: &str, value: Vec<u8>) -> Result<bool, KeyValueStoreError>;

    /// Replace the value only if it currently equals `expected`.
    async fn cas_update(&self, key: &str, expected: &[u8], new_value: Vec<u8>) -> Result<bool, KeyValueStoreError>;

    /// Remove `key`, returning whether it existed.
    ///
    /// Named `delete_key` so it does not shadow [`KeyValueStore::delete`].
    async fn delete_key(&self, key: &str) -> Result<bool, KeyValueStoreError>;

    /// Remove `key` only if its value currently equals `expected`.
    async fn cas_delete(&self, key: &str, expected: &[u8]) -> Result<bool, KeyValueStoreError>;

    /// One page of at most `limit` entries under `prefix` strictly after `after`.
    async fn scan_page(
        &self,
        prefix: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<ScanResult, KeyValueStoreError>;

    /// Every entry under `prefix` in ascending key order, following
    /// continuation tokens until the range is exhausted.
    async fn range_scan(&self, prefix: &str) -> Result<Vec<KeyValueEntry>, KeyValueStoreError>;
}

fn cas_outcome(result: Result<kscdb_kv_types::WriteResult, KeyValueStoreError>) -> Result<bool, KeyValueStoreError> {
    match result {
        Ok(_) => Ok(true),
        Err(KeyValueStoreError::CompareAndSwapFailed { .. }) => Ok(false),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyOrderedStore for T {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KeyValueStoreError> {
        match self.read(ReadRequest::new(key)).await {
            Ok(result) => Ok(result.kv.map(|kv| kv.value)),
            Err(KeyValueStoreError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), KeyValueStoreError> {
        self.write(WriteRequest::set(key, value)).await?;
        Ok(())
    }

    async fn cas_insert(&self, key: &str, value: Vec<u8>) -> Result<bool, KeyValueStoreError> {
        cas_outcome(self.write(WriteRequest::compare_and_swap(key, None, value)).await)
    }

    async fn cas_update(&self, key: &str, expected: &[u8], new_value: Vec<u8>) -> Result<bool, KeyValueStoreError> {
        cas_outcome(self.write(WriteRequest::compare_and_swap(key, Some(expected.to_vec()), new_value)).await)
    }

    async fn delete_key(&self, key: &str) -> Result<bool, KeyValueStoreError> {
        Ok(KeyValueStore::delete(self, DeleteRequest::new(key)).await?.is_deleted)
    }

    async fn cas_delete(&self, key: &str, expected: &[u8]) -> Result<bool, KeyValueStoreError> {
        cas_outcome(self.write(WriteRequest::compare_and_delete(key, expected.to_vec())).await)
    }

    async fn scan_page(
        &self,
        prefix: &str,
        limit: u32,
        after: Option<&str>,
    ) -> Result<ScanResult, KeyValueStoreError> {
        let request = ScanRequest::prefix(prefix)
            .with_limit(limit)
            .with_continuation_token(after.map(encode_continuation_token));
        self.scan(request).await
    }

    async fn range_scan(&self, prefix: &str) -> Result<Vec<KeyValueEntry>, KeyValueStoreError> {
        let mut entries = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let request = ScanRequest::prefix(prefix).with_continuation_token(token.take());
            let page = self.scan(request).await?;
            let page_len = page.entries.len();
            entries.extend(page.entries);
            match page.continuation_token {
                Some(next) if page.is_truncated && page_len > 0 => token = Some(next),
                _ => break,
            }
        }
        trace!(prefix, count = entries.len(), "range scan complete");
        Ok(entries)
    }
}
