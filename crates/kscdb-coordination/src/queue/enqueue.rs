//! Queue enqueue operations.

use kscdb_traits::KeyOrderedStore;
use kscdb_traits::KeyValueStore;
use tracing::debug;

use super::QueueEntryKey;
use super::QueueManager;
use super::types::StoredEntry;
use crate::error::CoordinationError;
use crate::types::now_unix_us;
use crate::verified;

impl<S: KeyValueStore + ?Sized + 'static> QueueManager<S> {
    /// Append `payload` to queue `name`, timestamped with the current time.
    pub async fn enqueue(&self, name: &str, payload: Vec<u8>) -> Result<QueueEntryKey, CoordinationError> {
        self.enqueue_at(name, payload, now_unix_us()).await
    }

    /// Append `payload` with an explicit insertion time (Unix µs).
    ///
    /// Entries with equal timestamps are ordered by their random tiebreak.
    pub async fn enqueue_at(
        &self,
        name: &str,
        payload: Vec<u8>,
        inserted_at_us: u64,
    ) -> Result<QueueEntryKey, CoordinationError> {
        super::check_queue_name(name)?;
        let tiebreak = uuid::Uuid::new_v4().simple().to_string();
        let key = verified::entry_key(name, inserted_at_us, &tiebreak);
        let payload_len = payload.len();
        let value = serde_json::to_vec(&StoredEntry {
            claimed: false,
            payload,
        })?;

        self.store.set(&key, value).await?;
        debug!(name, key, inserted_at_us, payload_len, "enqueued");

        Ok(QueueEntryKey {
            key,
            inserted_at_us,
            tiebreak,
        })
    }
}
