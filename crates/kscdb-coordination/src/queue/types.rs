//! Queue type definitions.

use kscdb_constants::coordination::DEFAULT_QUEUE_CLAIM_ATTEMPTS;
use kscdb_constants::coordination::DEFAULT_QUEUE_SCAN_BATCH;
use serde::Deserialize;
use serde::Serialize;

/// Configuration for [`QueueManager`](super::QueueManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Claim attempts within one dequeue before giving up.
    pub max_claim_attempts: u32,
    /// Page size when scanning entries.
    pub scan_batch_size: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_claim_attempts: DEFAULT_QUEUE_CLAIM_ATTEMPTS,
            scan_batch_size: DEFAULT_QUEUE_SCAN_BATCH,
        }
    }
}

/// Value stored at an entry key. The payload is base64 text in the JSON form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct StoredEntry {
    pub claimed: bool,
    #[serde(with = "payload_base64")]
    pub payload: Vec<u8>,
}

mod payload_base64 {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    pub fn serialize<S: Serializer>(payload: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(payload))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

/// Location of an enqueued entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntryKey {
    /// Full storage key.
    pub key: String,
    /// Insertion time (Unix µs).
    pub inserted_at_us: u64,
    /// Random tiebreak (UUIDv4, simple form).
    pub tiebreak: String,
}

/// An entry as seen by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub key: String,
    pub inserted_at_us: u64,
    pub tiebreak: String,
    pub claimed: bool,
    pub payload: Vec<u8>,
}

/// An entry removed from the queue by `dequeue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DequeuedItem {
    pub payload: Vec<u8>,
    pub inserted_at_us: u64,
    pub tiebreak: String,
    /// Claim rounds used, including the successful one.
    pub claim_attempts: u32,
}
