//! Queue clear operation.

use kscdb_traits::KeyOrderedStore;
use kscdb_traits::KeyValueStore;
use tracing::info;

use super::QueueManager;
use crate::error::CoordinationError;
use crate::verified;

impl<S: KeyValueStore + ?Sized + 'static> QueueManager<S> {
    /// Delete every entry of `name`, claimed or not. Returns the number deleted.
    ///
    /// Best effort: takes no lock and is not atomic. Entries enqueued while
    /// the clear runs may survive, and a consumer mid-dequeue may still
    /// return an entry that was counted here.
    pub async fn clear(&self, name: &str) -> Result<u64, CoordinationError> {
        super::check_queue_name(name)?;
        let prefix = verified::queue_prefix(name);
        let entries = self.store.range_scan(&prefix).await?;

        let mut deleted: u64 = 0;
        for entry in entries {
            if verified::parse_entry_key(name, &entry.key).is_none() {
                continue;
            }
            if self.store.delete_key(&entry.key).await? {
                deleted += 1;
            }
        }
        info!(name, deleted, "queue cleared");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use kscdb_testing::DeterministicKeyValueStore;

    use super::super::tests::manager;

    #[tokio::test]
    async fn clear_removes_all_entries() {
        let queue = manager(DeterministicKeyValueStore::new());
        for ts in 0..5 {
            queue.enqueue_at("jobs", b"x".to_vec(), ts).await.unwrap();
        }
        queue.enqueue_at("jobs:archive", b"keep".to_vec(), 1).await.unwrap();

        assert_eq!(queue.clear("jobs").await.unwrap(), 5);
        assert!(queue.dequeue("jobs").await.unwrap_err().is_empty_queue());
        assert_eq!(queue.len("jobs:archive").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn clear_empty_queue() {
        let queue = manager(DeterministicKeyValueStore::new());
        assert_eq!(queue.clear("jobs").await.unwrap(), 0);
    }
}
