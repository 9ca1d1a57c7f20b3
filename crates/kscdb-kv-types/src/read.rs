//! Read and delete operation types.

use serde::Deserialize;
use serde::Serialize;

use crate::KeyValueEntry;

/// Request to read a single key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadRequest {
    pub key: String,
}

impl ReadRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Response from a read operation. `kv` is `None` when the key is absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadResult {
    pub kv: Option<KeyValueEntry>,
}

/// Request to delete a key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteRequest {
    pub key: String,
}

impl DeleteRequest {
    /// Create a delete request for the specified key.
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Result of a delete operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteResult {
    pub key: String,
    /// True if the key existed and was removed; deleting an absent key is not an error.
    #[serde(alias = "deleted")]
    pub is_deleted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_result_accepts_legacy_field_name() {
        let parsed: DeleteResult = serde_json::from_str(r#"{"key":"k","deleted":true}"#).unwrap();
        assert!(parsed.is_deleted);
        assert_eq!(parsed.key, "k");
    }

    #[test]
    fn read_result_serialization_roundtrip() {
        let result = ReadResult {
            kv: Some(KeyValueEntry::new("key", b"value".to_vec())),
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: ReadResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }
}
