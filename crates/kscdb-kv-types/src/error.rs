use thiserror::Error;

/// Errors returned by a key-value backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyValueStoreError {
    #[error("key '{key}' not found")]
    NotFound { key: String },
    #[error("operation failed: {reason}")]
    Failed { reason: String },
    #[error("key must not be empty")]
    EmptyKey,
    #[error("key size {size} exceeds maximum of {max} bytes")]
    KeyTooLarge { size: u32, max: u32 },
    #[error("value size {size} exceeds maximum of {max} bytes")]
    ValueTooLarge { size: u32, max: u32 },
    /// A conditional write observed a different value than expected.
    ///
    /// `expected: None` means the write required the key to be absent.
    #[error("compare-and-swap failed for key '{key}'")]
    CompareAndSwapFailed {
        key: String,
        expected: Option<Vec<u8>>,
        actual: Option<Vec<u8>>,
    },
}

impl KeyValueStoreError {
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed { reason: reason.into() }
    }

    /// True for a lost compare-and-swap race (as opposed to a backend fault).
    pub fn is_cas_failure(&self) -> bool {
        matches!(self, Self::CompareAndSwapFailed { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cas_failure_is_classified() {
        let err = KeyValueStoreError::CompareAndSwapFailed {
            key: "k".into(),
            expected: None,
            actual: Some(b"v".to_vec()),
        };
        assert!(err.is_cas_failure());
        assert!(!err.is_not_found());
        assert!(!KeyValueStoreError::failed("disk").is_cas_failure());
    }

    #[test]
    fn display_includes_context() {
        let err = KeyValueStoreError::KeyTooLarge { size: 2048, max: 1024 };
        assert_eq!(err.to_string(), "key size 2048 exceeds maximum of 1024 bytes");
        assert_eq!(KeyValueStoreError::NotFound { key: "a/b".into() }.to_string(), "key 'a/b' not found");
    }
}
