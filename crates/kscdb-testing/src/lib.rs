//! Testing backends for kscdb.
//!
//! - [`DeterministicKeyValueStore`]: in-memory ordered map with exact
//!   compare-and-swap semantics and paginated prefix scans.
//! - [`FaultInjectingStore`]: wraps any backend and fails selected operations
//!   with `KeyValueStoreError::Failed`.
//! - [`StaleReadStore`]: wraps any backend and reports a configurable number
//!   of reads as absent, modelling a replica that lags behind writes.
//! - [`RacingWriterStore`]: wraps any backend and makes the next conditional
//!   writes under a prefix lose to a simulated competing writer.
//!
//! # Usage
//!
//! ```ignore
//! let store = DeterministicKeyValueStore::new();
//! let faulty = FaultInjectingStore::new(store.clone());
//! faulty.fail_writes_with_prefix("__ids:");
//! ```

mod deterministic;
mod fault;
mod racing;
mod stale;

pub use deterministic::DeterministicKeyValueStore;
pub use fault::FaultInjectingStore;
pub use fault::StoreOperation;
pub use racing::RacingWriterStore;
pub use stale::StaleReadStore;
