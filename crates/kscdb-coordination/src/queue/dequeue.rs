//! Queue dequeue operations.

use kscdb_traits::KeyOrderedStore;
use kscdb_traits::KeyValueStore;
use tracing::debug;
use tracing::warn;

use super::DequeuedItem;
use super::QueueEntry;
use super::QueueManager;
use super::types::StoredEntry;
use crate::error::CoordinationError;
use crate::error::EmptyQueueSnafu;
use crate::error::MaxRetriesExceededSnafu;
use crate::lock::finish_locked;

impl<S: KeyValueStore + ?Sized + 'static> QueueManager<S> {
    /// Remove and return the oldest unclaimed entry of `name`.
    ///
    /// Returns `EmptyQueue` when nothing is available; callers polling a
    /// queue should treat that as normal flow (see
    /// [`CoordinationError::is_empty_queue`]).
    pub async fn dequeue(&self, name: &str) -> Result<DequeuedItem, CoordinationError> {
        super::check_queue_name(name)?;
        let token = self.lock.acquire(name).await?;
        let result = self.claim_next(name).await;
        let release = self.lock.release(name, &token).await;
        finish_locked(name, result, release)
    }

    async fn claim_next(&self, name: &str) -> Result<DequeuedItem, CoordinationError> {
        let max_attempts = self.config.max_claim_attempts;
        for attempt in 1..=max_attempts {
            let Some((entry, observed)) = self.first_unclaimed(name).await? else {
                return EmptyQueueSnafu { name }.fail();
            };

            let claimed = serde_json::to_vec(&StoredEntry {
                claimed: true,
                payload: entry.payload.clone(),
            })?;
            if !self.store.cas_update(&entry.key, &observed, claimed).await? {
                debug!(name, key = %entry.key, attempt, "claim lost, rescanning");
                continue;
            }

            // The claim alone guarantees no other consumer receives this entry.
            // A failed delete leaves a claimed record behind for `clear`.
            if let Err(error) = self.store.delete_key(&entry.key).await {
                warn!(name, key = %entry.key, error = %error, "claimed entry not deleted");
            }
            debug!(name, key = %entry.key, attempt, "dequeued");
            return Ok(DequeuedItem {
                payload: entry.payload,
                inserted_at_us: entry.inserted_at_us,
                tiebreak: entry.tiebreak,
                claim_attempts: attempt,
            });
        }

        MaxRetriesExceededSnafu {
            operation: format!("dequeue from '{name}'"),
            attempts: max_attempts,
        }
        .fail()
    }

    /// Oldest unclaimed entry and its exact stored bytes.
    async fn first_unclaimed(&self, name: &str) -> Result<Option<(QueueEntry, Vec<u8>)>, CoordinationError> {
        let mut after: Option<String> = None;
        loop {
            let page = self.entry_page(name, after.as_deref()).await?;
            if let Some(found) = page.entries.into_iter().find(|(entry, _)| !entry.claimed) {
                return Ok(Some(found));
            }
            match page.next_after {
                Some(next) => after = Some(next),
                None => return Ok(None),
            }
        }
    }
}
