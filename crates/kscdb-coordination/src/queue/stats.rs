//! Queue inspection operations.

use kscdb_constants::api::MAX_SCAN_RESULTS;
use kscdb_kv_types::KeyValueEntry;
use kscdb_traits::KeyOrderedStore;
use kscdb_traits::KeyValueStore;
use tracing::warn;

use super::QueueEntry;
use super::QueueManager;
use super::types::StoredEntry;
use crate::error::CoordinationError;
use crate::verified;

/// One page of decoded entries plus the cursor for the next page.
pub(super) struct EntryPage {
    /// Decoded entries paired with their exact stored bytes.
    pub entries: Vec<(QueueEntry, Vec<u8>)>,
    /// Last raw key of the page when more keys may follow.
    pub next_after: Option<String>,
}

impl<S: KeyValueStore + ?Sized + 'static> QueueManager<S> {
    /// Up to `limit` unclaimed entries of `name` in dequeue order. No mutation.
    pub async fn peek(&self, name: &str, limit: u32) -> Result<Vec<QueueEntry>, CoordinationError> {
        let limit = limit.min(MAX_SCAN_RESULTS) as usize;
        let mut found = Vec::new();
        let mut after: Option<String> = None;
        while found.len() < limit {
            let page = self.entry_page(name, after.as_deref()).await?;
            found.extend(page.entries.into_iter().map(|(entry, _)| entry).filter(|entry| !entry.claimed));
            match page.next_after {
                Some(next) => after = Some(next),
                None => break,
            }
        }
        found.truncate(limit);
        Ok(found)
    }

    /// Number of unclaimed entries in `name`.
    pub async fn len(&self, name: &str) -> Result<u64, CoordinationError> {
        let mut count: u64 = 0;
        let mut after: Option<String> = None;
        loop {
            let page = self.entry_page(name, after.as_deref()).await?;
            count += page.entries.iter().filter(|(entry, _)| !entry.claimed).count() as u64;
            match page.next_after {
                Some(next) => after = Some(next),
                None => return Ok(count),
            }
        }
    }

    /// True if `name` has no unclaimed entries.
    pub async fn is_empty(&self, name: &str) -> Result<bool, CoordinationError> {
        Ok(self.peek(name, 1).await?.is_empty())
    }

    /// Scan one page under the queue prefix strictly after `after`.
    pub(super) async fn entry_page(&self, name: &str, after: Option<&str>) -> Result<EntryPage, CoordinationError> {
        super::check_queue_name(name)?;
        let prefix = verified::queue_prefix(name);
        let page = self.store.scan_page(&prefix, self.config.scan_batch_size, after).await?;
        let next_after = if page.is_truncated {
            page.entries.last().map(|e| e.key.clone())
        } else {
            None
        };
        let entries = page.entries.into_iter().filter_map(|kv| decode_entry(name, kv)).collect();
        Ok(EntryPage { entries, next_after })
    }
}

/// Decode a scanned record as an entry of queue `name`.
///
/// Keys of other queues sharing the prefix are skipped silently; entries of
/// this queue with undecodable values are skipped with a warning so one bad
/// record cannot wedge the queue.
fn decode_entry(name: &str, kv: KeyValueEntry) -> Option<(QueueEntry, Vec<u8>)> {
    let (inserted_at_us, tiebreak) = verified::parse_entry_key(name, &kv.key)?;
    let tiebreak = tiebreak.to_owned();
    let stored: StoredEntry = match serde_json::from_slice(&kv.value) {
        Ok(stored) => stored,
        Err(e) => {
            warn!(name, key = %kv.key, error = %e, "skipping undecodable queue entry");
            return None;
        }
    };
    let entry = QueueEntry {
        key: kv.key,
        inserted_at_us,
        tiebreak,
        claimed: stored.claimed,
        payload: stored.payload,
    };
    Some((entry, kv.value))
}
