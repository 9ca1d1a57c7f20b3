//! Deterministic in-memory key-value store.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use async_trait::async_trait;
use kscdb_kv_types::DeleteRequest;
use kscdb_kv_types::DeleteResult;
use kscdb_kv_types::KeyValueEntry;
use kscdb_kv_types::KeyValueStoreError;
use kscdb_kv_types::ReadRequest;
use kscdb_kv_types::ReadResult;
use kscdb_kv_types::ScanRequest;
use kscdb_kv_types::ScanResult;
use kscdb_kv_types::WriteCommand;
use kscdb_kv_types::WriteRequest;
use kscdb_kv_types::WriteResult;
use kscdb_kv_types::scan::build_scan_result;
use kscdb_kv_types::scan::decode_continuation_token;
use kscdb_kv_types::scan::effective_scan_limit;
use kscdb_kv_types::scan::in_prefix_range;
use kscdb_kv_types::scan::paginate_entries;
use kscdb_kv_types::validate_write_command;
use kscdb_kv_types::validation::validate_key;
use kscdb_traits::KeyValueStore;
use tokio::sync::RwLock;

/// Versioned value for tracking revisions.
#[derive(Clone)]
struct VersionedValue {
    value: Vec<u8>,
    revision: u64,
}

#[derive(Default)]
struct State {
    data: BTreeMap<String, VersionedValue>,
    revision: u64,
}

impl State {
    fn next_revision(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }

    fn put(&mut self, key: &str, value: Vec<u8>) -> u64 {
        let revision = self.next_revision();
        self.data.insert(key.to_owned(), VersionedValue { value, revision });
        revision
    }
}

/// A deterministic in-memory key-value store for testing.
///
/// All operations take a single lock, so every compare-and-swap is atomic and
/// every read observes the latest write. Keys iterate in byte-wise order
/// (`String` ordering), matching what ordered backends provide.
#[derive(Default)]
pub struct DeterministicKeyValueStore {
    state: RwLock<State>,
}

impl DeterministicKeyValueStore {
    /// Create a new deterministic store wrapped in Arc.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Number of live keys.
    pub async fn len(&self) -> usize {
        self.state.read().await.data.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of every key in order.
    pub async fn keys(&self) -> Vec<String> {
        self.state.read().await.data.keys().cloned().collect()
    }
}

#[async_trait]
impl KeyValueStore for DeterministicKeyValueStore {
    async fn write(&self, request: WriteRequest) -> Result<WriteResult, KeyValueStoreError> {
        validate_write_command(&request.command)?;

        let mut state = self.state.write().await;
        let revision = match &request.command {
            WriteCommand::Set { key, value } => state.put(key, value.clone()),
            WriteCommand::Delete { key } => {
                state.data.remove(key);
                state.next_revision()
            }
            WriteCommand::CompareAndSwap {
                key,
                expected,
                new_value,
            } => {
                let current = state.data.get(key).map(|v| v.value.clone());
                if current.as_ref() != expected.as_ref() {
                    return Err(KeyValueStoreError::CompareAndSwapFailed {
                        key: key.clone(),
                        expected: expected.clone(),
                        actual: current,
                    });
                }
                state.put(key, new_value.clone())
            }
            WriteCommand::CompareAndDelete { key, expected } => {
                let current = state.data.get(key).map(|v| v.value.clone());
                if current.as_ref() != Some(expected) {
                    return Err(KeyValueStoreError::CompareAndSwapFailed {
                        key: key.clone(),
                        expected: Some(expected.clone()),
                        actual: current,
                    });
                }
                state.data.remove(key);
                state.next_revision()
            }
        };

        Ok(WriteResult {
            command: Some(request.command),
            revision: Some(revision),
        })
    }

    async fn read(&self, request: ReadRequest) -> Result<ReadResult, KeyValueStoreError> {
        validate_key(&request.key)?;
        let state = self.state.read().await;
        let kv = state.data.get(&request.key).map(|versioned| KeyValueEntry {
            key: request.key.clone(),
            value: versioned.value.clone(),
            mod_revision: versioned.revision,
        });
        Ok(ReadResult { kv })
    }

    async fn delete(&self, request: DeleteRequest) -> Result<DeleteResult, KeyValueStoreError> {
        validate_key(&request.key)?;
        let mut state = self.state.write().await;
        let is_deleted = state.data.remove(&request.key).is_some();
        if is_deleted {
            state.next_revision();
        }
        Ok(DeleteResult {
            key: request.key,
            is_deleted,
        })
    }

    async fn scan(&self, request: ScanRequest) -> Result<ScanResult, KeyValueStoreError> {
        let limit = effective_scan_limit(request.limit);
        let start_after = decode_continuation_token(request.continuation_token.as_deref());
        let prefix = request.prefix.as_str();

        let state = self.state.read().await;
        let start = match &start_after {
            Some(after) if after.as_str() >= prefix => after.as_str(),
            _ => prefix,
        };
        // One extra entry tells us whether the page is truncated.
        let matching: Vec<KeyValueEntry> = state
            .data
            .range::<str, _>((Bound::Included(start), Bound::Unbounded))
            .filter(|(k, _)| start_after.as_deref() != Some(k.as_str()))
            .take_while(|(k, _)| in_prefix_range(k.as_bytes(), prefix.as_bytes()))
            .take(limit as usize + 1)
            .map(|(k, v)| KeyValueEntry {
                key: k.clone(),
                value: v.value.clone(),
                mod_revision: v.revision,
            })
            .collect();

        let (page, is_truncated) = paginate_entries(matching, limit);
        Ok(build_scan_result(page, is_truncated))
    }
}
