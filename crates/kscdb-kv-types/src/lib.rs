//! Key-value types shared by every kscdb backend and client.
//!
//! Requests, responses and the backend error enum that cross the
//! `KeyValueStore` seam, plus [`KeyList`], the value type produced by prefix
//! listings.

mod error;
pub mod key_list;
mod read;
pub mod scan;
pub mod validation;
mod write;

pub use error::KeyValueStoreError;
pub use key_list::KeyList;
pub use key_list::KeyListError;
pub use read::DeleteRequest;
pub use read::DeleteResult;
pub use read::ReadRequest;
pub use read::ReadResult;
pub use scan::ScanRequest;
pub use scan::ScanResult;
use serde::Deserialize;
use serde::Serialize;
pub use validation::validate_write_command;
pub use write::WriteCommand;
pub use write::WriteRequest;
pub use write::WriteResult;

/// A stored record together with its modification revision.
///
/// `mod_revision` is backend-defined; the in-memory backend uses a global
/// counter incremented on every mutation. Zero means "unknown".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyValueEntry {
    pub key: String,
    pub value: Vec<u8>,
    #[serde(default)]
    pub mod_revision: u64,
}

impl KeyValueEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            mod_revision: 0,
        }
    }
}
