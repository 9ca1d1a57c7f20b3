//! Multi-producer, multi-consumer named queue.
//!
//! Entries are stored one per key under `__queue:<name>:` in
//! `(inserted_at_us, tiebreak)` order. Producers write entries with a plain
//! set. Consumers serialize on the queue's lock, claim the oldest unclaimed
//! entry with a compare-and-swap on its exact stored bytes, then delete it.
//!
//! Features:
//! - FIFO by insertion timestamp, random tiebreak for equal timestamps
//! - At-most-once delivery: each entry is handed to at most one consumer
//! - Bounded claim retries reported on the dequeued item
//! - Non-mutating peek and length

mod clear;
mod dequeue;
mod enqueue;
mod stats;
mod types;

use std::sync::Arc;

use kscdb_traits::KeyValueStore;
pub use types::DequeuedItem;
pub use types::QueueConfig;
pub use types::QueueEntry;
pub use types::QueueEntryKey;

use crate::error::CoordinationError;
use crate::error::InvalidQueueNameSnafu;
use crate::lock::DistributedLock;
use crate::lock::LockConfig;
use crate::verified;

/// Manager for named queue operations.
pub struct QueueManager<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    lock: DistributedLock<S>,
    config: QueueConfig,
}

impl<S: KeyValueStore + ?Sized + 'static> QueueManager<S> {
    /// Create a new queue manager.
    pub fn new(store: Arc<S>, lock_config: LockConfig, config: QueueConfig) -> Self {
        Self {
            lock: DistributedLock::new(Arc::clone(&store), lock_config),
            store,
            config,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }
}

fn check_queue_name(name: &str) -> Result<(), CoordinationError> {
    match verified::queue_name_error(name) {
        Some(reason) => InvalidQueueNameSnafu { name, reason }.fail(),
        None => Ok(()),
    }
}
