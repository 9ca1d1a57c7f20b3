//! Backend traits for kscdb.
//!
//! [`KeyValueStore`] is the seam every backend implements: four request/response
//! operations over single keys plus prefix scans. [`KeyOrderedStore`] layers the
//! compare-and-swap vocabulary the coordination primitives are written against
//! (`get`, `cas_insert`, `cas_update`, `cas_delete`, `range_scan`) and is
//! implemented for every `KeyValueStore` automatically.

mod ordered;

use async_trait::async_trait;
pub use kscdb_kv_types::scan::prefix_upper_bound;
use kscdb_kv_types::DeleteRequest;
use kscdb_kv_types::DeleteResult;
use kscdb_kv_types::KeyValueStoreError;
use kscdb_kv_types::ReadRequest;
use kscdb_kv_types::ReadResult;
use kscdb_kv_types::ScanRequest;
use kscdb_kv_types::ScanResult;
use kscdb_kv_types::WriteRequest;
use kscdb_kv_types::WriteResult;
pub use ordered::KeyOrderedStore;

/// Key-value store interface.
///
/// Implementations must provide single-key atomicity for
/// `CompareAndSwap`/`CompareAndDelete` and return scan pages in ascending
/// byte-wise key order. Nothing else is assumed: there are no multi-key
/// transactions, and reads may lag writes on eventually consistent backends.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Apply a single write command.
    async fn write(&self, request: WriteRequest) -> Result<WriteResult, KeyValueStoreError>;

    /// Read a value by key.
    async fn read(&self, request: ReadRequest) -> Result<ReadResult, KeyValueStoreError>;

    /// Delete a key from the store.
    ///
    /// Returns Ok with `is_deleted = false` if the key was not found (idempotent).
    async fn delete(&self, request: DeleteRequest) -> Result<DeleteResult, KeyValueStoreError>;

    /// Scan keys matching a prefix with pagination support.
    async fn scan(&self, request: ScanRequest) -> Result<ScanResult, KeyValueStoreError>;
}

// Blanket implementation for Arc<T>
#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    async fn write(&self, request: WriteRequest) -> Result<WriteResult, KeyValueStoreError> {
        (**self).write(request).await
    }

    async fn read(&self, request: ReadRequest) -> Result<ReadResult, KeyValueStoreError> {
        (**self).read(request).await
    }

    async fn delete(&self, request: DeleteRequest) -> Result<DeleteResult, KeyValueStoreError> {
        (**self).delete(request).await
    }

    async fn scan(&self, request: ScanRequest) -> Result<ScanResult, KeyValueStoreError> {
        (**self).scan(request).await
    }
}
