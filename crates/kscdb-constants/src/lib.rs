//! Centralized constants for kscdb.
//!
//! Every bound used by the key-value types, the coordination primitives and the
//! remote invocation codec lives here, grouped by the layer that consumes it.
//!
//! # Modules
//!
//! - [`api`]: Key-value API bounds (key/value sizes, scan limits)
//! - [`coordination`]: Lock backoff defaults, queue and counter key layout
//! - [`plugin`]: Capability registry and wire format limits
//!
//! Access constants via their submodule:
//! ```
//! use kscdb_constants::api::MAX_KEY_SIZE;
//! use kscdb_constants::coordination::LOCK_INITIAL_BACKOFF_MS;
//! ```

pub mod api;
mod assertions;
pub mod coordination;
pub mod plugin;

pub use api::DEFAULT_SCAN_LIMIT;
pub use api::MAX_KEY_SIZE;
pub use api::MAX_SCAN_RESULTS;
pub use api::MAX_VALUE_SIZE;
