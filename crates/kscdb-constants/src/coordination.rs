//! Coordination primitive constants.
//!
//! Key layout prefixes and the default tunables for the lock backoff policy,
//! the ID allocator and the named queue. Defaults are only starting values:
//! each one can be overridden through `KscdbConfig`.

// ============================================================================
// Lock Backoff
// ============================================================================

/// Floor applied to every backoff delay, whatever the configuration.
pub const LOCK_MIN_BACKOFF_MS: u64 = 1;

/// Initial delay between lock acquisition attempts in milliseconds.
pub const LOCK_INITIAL_BACKOFF_MS: u64 = 2;

/// Upper bound for the delay between lock acquisition attempts in milliseconds.
pub const LOCK_MAX_BACKOFF_MS: u64 = 250;

/// Hard ceiling accepted for any configured backoff value (one minute).
pub const MAX_LOCK_BACKOFF_MS: u64 = 60_000;

/// Separator between a lock token and its lease deadline in a lock record.
pub const LOCK_LEASE_SEPARATOR: char = '@';

/// Bound on release rounds when the lock record keeps changing underneath.
pub const LOCK_MAX_RELEASE_ATTEMPTS: u32 = 8;

// ============================================================================
// ID Allocator
// ============================================================================

/// Key prefix under which counter records are stored.
pub const COUNTER_KEY_PREFIX: &str = "__ids:";

/// Suffix appended to a counter name to form its lock key.
pub const COUNTER_LOCK_SUFFIX: &str = "/lock";

/// First ID handed out by a freshly created counter.
pub const DEFAULT_COUNTER_START_VALUE: u64 = 1;

// ============================================================================
// Named Queue
// ============================================================================

/// Key prefix under which queue entries are stored.
pub const QUEUE_KEY_PREFIX: &str = "__queue:";

/// Separator between the components of a queue entry key.
pub const QUEUE_KEY_SEPARATOR: char = ':';

/// Width of the zero-padded timestamp segment in a queue entry key.
///
/// 20 digits hold any `u64`, so lexicographic order equals numeric order.
pub const QUEUE_TIMESTAMP_WIDTH: usize = 20;

/// Default bound on claim attempts within a single dequeue.
pub const DEFAULT_QUEUE_CLAIM_ATTEMPTS: u32 = 8;

/// Maximum configurable claim attempts within a single dequeue.
pub const MAX_QUEUE_CLAIM_ATTEMPTS: u32 = 1_000;

/// Default page size used when scanning queue entries.
pub const DEFAULT_QUEUE_SCAN_BATCH: u32 = 100;
