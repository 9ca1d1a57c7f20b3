//! Error types for coordination primitives.

use kscdb_kv_types::KeyValueStoreError;
use snafu::Snafu;

/// Errors from coordination primitives.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CoordinationError {
    /// Release was attempted on a lock key that has no record.
    #[snafu(display("lock '{key}' is not held"))]
    LockNotHeld {
        /// The lock key.
        key: String,
    },

    /// The lock is held, but by a different token than the one presented.
    #[snafu(display("lock '{key}' is held by '{holder}', not the presented token"))]
    TokenMismatch {
        /// The lock key.
        key: String,
        /// Token found in the lock record.
        holder: String,
    },

    /// The named queue has no unclaimed entries. Normal flow for pollers.
    #[snafu(display("queue '{name}' is empty"))]
    EmptyQueue {
        /// Queue name.
        name: String,
    },

    /// The queue name cannot address a queue.
    #[snafu(display("invalid queue name '{name}': {reason}"))]
    InvalidQueueName {
        /// Queue name as given.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Operation timed out.
    #[snafu(display("operation timed out: {operation}"))]
    Timeout {
        /// Description of the operation.
        operation: String,
    },

    /// Maximum retries exceeded.
    #[snafu(display("max retries exceeded for {operation}: {attempts} attempts"))]
    MaxRetriesExceeded {
        /// Description of the operation.
        operation: String,
        /// Number of attempts made.
        attempts: u32,
    },

    /// Counter reached `u64::MAX`.
    #[snafu(display("sequence exhausted for key '{key}'"))]
    SequenceExhausted {
        /// The counter key.
        key: String,
    },

    /// Data in storage is corrupted or unparseable.
    #[snafu(display("corrupted data in key '{key}': {reason}"))]
    CorruptedData {
        /// The key with corrupted data.
        key: String,
        /// Description of what went wrong.
        reason: String,
    },

    /// Underlying storage error.
    #[snafu(display("storage error: {source}"))]
    Storage {
        /// The underlying error.
        source: KeyValueStoreError,
    },

    /// JSON serialization/deserialization error.
    #[snafu(display("serialization error: {source}"))]
    Serialization {
        /// The underlying error.
        source: serde_json::Error,
    },
}

impl CoordinationError {
    /// True for [`CoordinationError::EmptyQueue`].
    pub fn is_empty_queue(&self) -> bool {
        matches!(self, CoordinationError::EmptyQueue { .. })
    }

    /// True when the error came from the backend rather than from
    /// coordination logic.
    pub fn is_storage(&self) -> bool {
        matches!(self, CoordinationError::Storage { .. })
    }
}

impl From<KeyValueStoreError> for CoordinationError {
    fn from(source: KeyValueStoreError) -> Self {
        CoordinationError::Storage { source }
    }
}

impl From<serde_json::Error> for CoordinationError {
    fn from(source: serde_json::Error) -> Self {
        CoordinationError::Serialization { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_queue_is_classified() {
        let err = EmptyQueueSnafu { name: "jobs" }.build();
        assert!(err.is_empty_queue());
        assert!(!err.is_storage());
        assert_eq!(err.to_string(), "queue 'jobs' is empty");
    }

    #[test]
    fn storage_errors_convert() {
        let err: CoordinationError = KeyValueStoreError::failed("disk full").into();
        assert!(err.is_storage());
        assert_eq!(err.to_string(), "storage error: operation failed: disk full");
    }
}
