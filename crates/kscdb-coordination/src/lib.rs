//! Coordination primitives built on single-key compare-and-swap.
//!
//! - `DistributedLock` - Token-based mutual exclusion with optional leases
//! - `IdAllocator` - Monotonically increasing unique IDs per named counter
//! - `QueueManager` - Multi-producer, multi-consumer FIFO queues
//!
//! All primitives are generic over the [`kscdb_traits::KeyValueStore`] trait
//! and only rely on the `KeyOrderedStore` operations: `cas_insert`,
//! `cas_update`, `cas_delete`, `get`, `delete_key` and prefix scans. They hold
//! no in-process state between calls; every client coordinates through the
//! backend alone.
//!
//! ## Lock Example
//!
//! ```ignore
//! use kscdb_coordination::{DistributedLock, LockConfig};
//!
//! let lock = DistributedLock::new(store, LockConfig::default());
//! let token = lock.acquire("reports/nightly").await?;
//! // Protected critical section
//! lock.release("reports/nightly", &token).await?;
//! ```
//!
//! ## Queue Example
//!
//! ```ignore
//! use kscdb_coordination::{QueueConfig, QueueManager, LockConfig};
//!
//! let queue = QueueManager::new(store, LockConfig::default(), QueueConfig::default());
//! queue.enqueue("emails", b"hello".to_vec()).await?;
//! match queue.dequeue("emails").await {
//!     Ok(item) => send(item.payload),
//!     Err(e) if e.is_empty_queue() => {}
//!     Err(e) => return Err(e),
//! }
//! ```

mod error;
mod ids;
mod lock;
mod queue;
#[cfg(test)]
mod test_support;
mod types;
pub mod verified;

pub use error::CoordinationError;
pub use ids::IdAllocator;
pub use ids::IdConfig;
pub use lock::BackoffPolicy;
pub use lock::DistributedLock;
pub use lock::LockConfig;
pub use queue::DequeuedItem;
pub use queue::QueueConfig;
pub use queue::QueueEntry;
pub use queue::QueueEntryKey;
pub use queue::QueueManager;
pub use types::LockRecord;
pub use types::LockToken;
pub use types::now_unix_ms;
pub use types::now_unix_us;
