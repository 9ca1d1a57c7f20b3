//! Shared types for coordination primitives.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// Proof of lock ownership: the random token written into the lock record.
///
/// Tokens are UUIDv4 strings generated per acquisition and compared
/// byte-for-byte on release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockToken(String);

impl LockToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing token string, e.g. one handed over from another process.
    pub fn from_string(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Decoded contents of a lock record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Token of the current holder.
    pub token: String,
    /// Lease deadline (Unix ms). `None` means the record never expires.
    pub lease_deadline_ms: Option<u64>,
}

impl LockRecord {
    /// True if `token` is the holder recorded here.
    pub fn is_held_by(&self, token: &LockToken) -> bool {
        self.token == token.as_str()
    }

    /// True if the record carries a lease that ended before `now_ms`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        crate::verified::is_lease_expired(self.lease_deadline_ms, now_ms)
    }
}

/// Get current Unix timestamp in milliseconds.
pub fn now_unix_ms() -> u64 {
    use std::time::SystemTime;
    use std::time::UNIX_EPOCH;
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Get current Unix timestamp in microseconds.
pub fn now_unix_us() -> u64 {
    use std::time::SystemTime;
    use std::time::UNIX_EPOCH;
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_distinct() {
        let a = LockToken::generate();
        let b = LockToken::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn record_ownership() {
        let token = LockToken::from_string("abc");
        let record = LockRecord {
            token: "abc".into(),
            lease_deadline_ms: None,
        };
        assert!(record.is_held_by(&token));
        assert!(!record.is_held_by(&LockToken::from_string("abd")));
        assert!(!record.is_expired(u64::MAX));
    }

    #[test]
    fn clock_units_agree() {
        let ms = now_unix_ms();
        let us = now_unix_us();
        assert!(us / 1_000 >= ms);
    }
}
