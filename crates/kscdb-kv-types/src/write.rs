//! Write operation types.

use serde::Deserialize;
use serde::Serialize;

/// Single-key mutations a backend must support.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum WriteCommand {
    /// Unconditionally store a value.
    Set { key: String, value: Vec<u8> },
    /// Remove a key; absent keys are not an error.
    Delete { key: String },
    /// Store `new_value` only if the current value equals `expected`.
    ///
    /// `expected: None` means "only if the key is absent".
    CompareAndSwap {
        key: String,
        expected: Option<Vec<u8>>,
        new_value: Vec<u8>,
    },
    /// Remove the key only if the current value equals `expected`.
    CompareAndDelete { key: String, expected: Vec<u8> },
}

impl WriteCommand {
    /// Key targeted by this command.
    pub fn key(&self) -> &str {
        match self {
            Self::Set { key, .. }
            | Self::Delete { key }
            | Self::CompareAndSwap { key, .. }
            | Self::CompareAndDelete { key, .. } => key,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteRequest {
    pub command: WriteCommand,
}

impl WriteRequest {
    /// Create a Set command to store a key-value pair.
    pub fn set(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            command: WriteCommand::Set {
                key: key.into(),
                value: value.into(),
            },
        }
    }

    /// Create a Delete command.
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            command: WriteCommand::Delete { key: key.into() },
        }
    }

    /// Create a CompareAndSwap command.
    pub fn compare_and_swap(key: impl Into<String>, expected: Option<Vec<u8>>, new_value: impl Into<Vec<u8>>) -> Self {
        Self {
            command: WriteCommand::CompareAndSwap {
                key: key.into(),
                expected,
                new_value: new_value.into(),
            },
        }
    }

    /// Create a CompareAndDelete command.
    pub fn compare_and_delete(key: impl Into<String>, expected: impl Into<Vec<u8>>) -> Self {
        Self {
            command: WriteCommand::CompareAndDelete {
                key: key.into(),
                expected: expected.into(),
            },
        }
    }
}

/// Outcome of a successful write. Failed conditions surface as
/// `KeyValueStoreError::CompareAndSwapFailed` rather than a flag here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WriteResult {
    pub command: Option<WriteCommand>,
    /// Revision assigned to the mutation, when the backend tracks one.
    #[serde(default)]
    pub revision: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compare_and_swap_insert_has_no_expected() {
        let req = WriteRequest::compare_and_swap("lock", None, b"token".to_vec());
        match req.command {
            WriteCommand::CompareAndSwap { key, expected, new_value } => {
                assert_eq!(key, "lock");
                assert!(expected.is_none());
                assert_eq!(new_value, b"token");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn command_key_accessor() {
        assert_eq!(WriteRequest::set("a", b"1".to_vec()).command.key(), "a");
        assert_eq!(WriteRequest::delete("b").command.key(), "b");
        assert_eq!(WriteRequest::compare_and_delete("c", b"x".to_vec()).command.key(), "c");
    }
}
