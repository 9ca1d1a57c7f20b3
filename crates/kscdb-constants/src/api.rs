//! Key-value API bounds.
//!
//! These limits apply to every write and scan that reaches a backend through
//! the `KeyValueStore` trait. They keep a single request from allocating
//! without bound.

// ============================================================================
// Key-Value Size Limits
// ============================================================================

/// Maximum size of a single key in bytes (1 KB).
pub const MAX_KEY_SIZE: u32 = 1024;

/// Maximum size of a single value in bytes (1 MB).
pub const MAX_VALUE_SIZE: u32 = 1024 * 1024;

// ============================================================================
// Scan Limits
// ============================================================================

/// Maximum number of entries returned by a single scan page.
pub const MAX_SCAN_RESULTS: u32 = 10_000;

/// Number of entries returned by a scan page when no limit is given.
pub const DEFAULT_SCAN_LIMIT: u32 = 1_000;
