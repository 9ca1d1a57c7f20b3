//! Pure functions behind the coordination primitives.
//!
//! Everything in this module is deterministic: no I/O, no clocks, no
//! randomness. Time and jitter are passed in as parameters so the imperative
//! shells (`lock.rs`, `ids.rs`, `queue/`) stay thin and these functions can be
//! tested exhaustively.
//!
//! # Module Organization
//!
//! - [`lock`]: lock record encoding, lease expiry
//! - [`backoff`]: exponential backoff with jitter
//! - [`sequence`]: counter key layout and value encoding
//! - [`queue`]: queue entry key layout and ordering

pub mod backoff;
pub mod lock;
pub mod queue;
pub mod sequence;

// ============================================================================
// Re-exports: Lock
// ============================================================================

pub use backoff::BackoffStep;
pub use backoff::compute_backoff_step;
pub use lock::compute_lease_deadline;
pub use lock::encode_lock_record;
pub use lock::is_lease_expired;
pub use lock::parse_lock_record;

// ============================================================================
// Re-exports: Sequence
// ============================================================================

pub use sequence::compute_next_id;
pub use sequence::counter_key;
pub use sequence::counter_lock_key;
pub use sequence::encode_counter;
pub use sequence::parse_counter;

// ============================================================================
// Re-exports: Queue
// ============================================================================

pub use queue::entry_key;
pub use queue::parse_entry_key;
pub use queue::queue_prefix;
pub use queue::queue_name_error;
