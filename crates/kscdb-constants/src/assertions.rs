//! Compile-time relationships between constants.

use super::api::*;
use super::coordination::*;
use super::plugin::*;

// Scan defaults must fit under the hard limit.
const _: () = assert!(DEFAULT_SCAN_LIMIT > 0);
const _: () = assert!(DEFAULT_SCAN_LIMIT <= MAX_SCAN_RESULTS);
const _: () = assert!(MAX_KEY_SIZE < MAX_VALUE_SIZE);

// Backoff progression.
const _: () = assert!(LOCK_MIN_BACKOFF_MS > 0);
const _: () = assert!(LOCK_MIN_BACKOFF_MS <= LOCK_INITIAL_BACKOFF_MS);
const _: () = assert!(LOCK_INITIAL_BACKOFF_MS <= LOCK_MAX_BACKOFF_MS);
const _: () = assert!(LOCK_MAX_BACKOFF_MS <= MAX_LOCK_BACKOFF_MS);
const _: () = assert!(LOCK_MAX_RELEASE_ATTEMPTS > 0);

// Queue bounds.
const _: () = assert!(DEFAULT_QUEUE_CLAIM_ATTEMPTS > 0);
const _: () = assert!(DEFAULT_QUEUE_CLAIM_ATTEMPTS <= MAX_QUEUE_CLAIM_ATTEMPTS);
const _: () = assert!(DEFAULT_QUEUE_SCAN_BATCH <= MAX_SCAN_RESULTS);
const _: () = assert!(QUEUE_TIMESTAMP_WIDTH >= 20);

// Counters start above zero so zero never appears as an allocated ID.
const _: () = assert!(DEFAULT_COUNTER_START_VALUE > 0);

const _: () = assert!(MAX_CAPABILITIES > 0);
const _: () = assert!(MAX_WIRE_STRING_LEN == 65_535);
