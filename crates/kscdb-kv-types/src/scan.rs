//! Prefix scan types and the pure pagination helpers backends share.
//!
//! A scan covers exactly the keys that start with `prefix`, in ascending
//! byte-wise order. Pages are resumed with an opaque continuation token: the
//! base64 encoding of the last key returned.

use base64::Engine;
use kscdb_constants::api::DEFAULT_SCAN_LIMIT;
use kscdb_constants::api::MAX_SCAN_RESULTS;
use serde::Deserialize;
use serde::Serialize;

use crate::KeyValueEntry;

/// Request to list keys under a prefix.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanRequest {
    pub prefix: String,
    /// Page size; clamped to `[1, MAX_SCAN_RESULTS]`, defaulting to `DEFAULT_SCAN_LIMIT`.
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

impl ScanRequest {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            limit: None,
            continuation_token: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_continuation_token(mut self, token: Option<String>) -> Self {
        self.continuation_token = token;
        self
    }
}

/// One page of scan results.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanResult {
    pub entries: Vec<KeyValueEntry>,
    pub count: u32,
    pub is_truncated: bool,
    /// Present iff `is_truncated`; pass back in the next request.
    pub continuation_token: Option<String>,
}

/// Normalize a requested page size into `[1, max]`.
#[inline]
pub fn normalize_scan_limit(limit: Option<u32>, default: u32, max: u32) -> u32 {
    limit.unwrap_or(default).clamp(1, max.max(1))
}

/// Page size for a request using the crate-wide bounds.
#[inline]
pub fn effective_scan_limit(limit: Option<u32>) -> u32 {
    normalize_scan_limit(limit, DEFAULT_SCAN_LIMIT, MAX_SCAN_RESULTS)
}

/// Decode a base64 continuation token back into the last key of the previous page.
///
/// Malformed tokens decode to `None`, restarting the scan from the prefix.
pub fn decode_continuation_token(token: Option<&str>) -> Option<String> {
    token.and_then(|t| {
        base64::engine::general_purpose::STANDARD
            .decode(t)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
    })
}

/// Encode a key as a base64 continuation token.
#[inline]
pub fn encode_continuation_token(key: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(key)
}

/// Split off the first `limit` entries, reporting whether any were left over.
pub fn paginate_entries<T>(entries: Vec<T>, limit: u32) -> (Vec<T>, bool) {
    let is_truncated = entries.len() > limit as usize;
    let paginated = entries.into_iter().take(limit as usize).collect();
    (paginated, is_truncated)
}

/// Assemble a [`ScanResult`] from an already ordered page.
pub fn build_scan_result(entries: Vec<KeyValueEntry>, is_truncated: bool) -> ScanResult {
    let continuation_token = if is_truncated {
        entries.last().map(|e| encode_continuation_token(&e.key))
    } else {
        None
    };
    ScanResult {
        count: entries.len() as u32,
        entries,
        is_truncated,
        continuation_token,
    }
}

/// Lexicographic successor of a prefix: the smallest byte string greater than
/// every string that starts with `prefix`.
///
/// Increments the last byte that is not `0xFF` and truncates after it. Returns
/// `None` when no such bound exists (empty prefix or all `0xFF`), meaning the
/// range is unbounded above.
pub fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let last = prefix.iter().rposition(|&b| b != 0xFF)?;
    let mut bound = prefix[..=last].to_vec();
    bound[last] += 1;
    Some(bound)
}

/// True if `key` lies in the half-open range `[prefix, prefix_upper_bound(prefix))`.
pub fn in_prefix_range(key: &[u8], prefix: &[u8]) -> bool {
    if key < prefix {
        return false;
    }
    match prefix_upper_bound(prefix) {
        Some(upper) => key < upper.as_slice(),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_normalize_limit_default() {
        assert_eq!(normalize_scan_limit(None, 1000, 10000), 1000);
    }

    #[test]
    fn test_normalize_limit_capped() {
        assert_eq!(normalize_scan_limit(Some(20000), 1000, 10000), 10000);
    }

    #[test]
    fn test_normalize_limit_zero_becomes_one() {
        assert_eq!(normalize_scan_limit(Some(0), 1000, 10000), 1);
    }

    #[test]
    fn test_effective_limit_uses_constants() {
        assert_eq!(effective_scan_limit(None), DEFAULT_SCAN_LIMIT);
        assert_eq!(effective_scan_limit(Some(u32::MAX)), MAX_SCAN_RESULTS);
    }

    #[test]
    fn test_token_roundtrip() {
        let key = "__queue:jobs:00000000000000000042:abc";
        let encoded = encode_continuation_token(key);
        assert_eq!(decode_continuation_token(Some(&encoded)), Some(key.to_string()));
    }

    #[test]
    fn test_decode_invalid_base64() {
        assert_eq!(decode_continuation_token(Some("not-valid-base64!!!")), None);
        assert_eq!(decode_continuation_token(None), None);
    }

    #[test]
    fn test_paginate_over_limit() {
        let (page, is_truncated) = paginate_entries(vec![1, 2, 3, 4, 5], 3);
        assert_eq!(page, vec![1, 2, 3]);
        assert!(is_truncated);
    }

    #[test]
    fn test_paginate_exact_limit_not_truncated() {
        let (page, is_truncated) = paginate_entries(vec![1, 2, 3], 3);
        assert_eq!(page.len(), 3);
        assert!(!is_truncated);
    }

    #[test]
    fn test_build_scan_result_token_only_when_truncated() {
        let entries = vec![KeyValueEntry::new("a", b"1".to_vec()), KeyValueEntry::new("b", b"2".to_vec())];
        let full = build_scan_result(entries.clone(), false);
        assert_eq!(full.count, 2);
        assert!(full.continuation_token.is_none());

        let partial = build_scan_result(entries, true);
        assert_eq!(decode_continuation_token(partial.continuation_token.as_deref()), Some("b".to_string()));
    }

    #[test]
    fn test_upper_bound_simple() {
        assert_eq!(prefix_upper_bound(b"abc"), Some(b"abd".to_vec()));
        assert_eq!(prefix_upper_bound(b"a:"), Some(b"a;".to_vec()));
    }

    #[test]
    fn test_upper_bound_trailing_ff() {
        assert_eq!(prefix_upper_bound(&[0x61, 0xFF, 0xFF]), Some(vec![0x62]));
    }

    #[test]
    fn test_upper_bound_unbounded() {
        assert_eq!(prefix_upper_bound(b""), None);
        assert_eq!(prefix_upper_bound(&[0xFF, 0xFF]), None);
    }

    proptest! {
        #[test]
        fn prop_range_matches_starts_with(prefix in proptest::collection::vec(any::<u8>(), 0..6),
                                          key in proptest::collection::vec(any::<u8>(), 0..10)) {
            prop_assert_eq!(in_prefix_range(&key, &prefix), key.starts_with(&prefix));
        }

        #[test]
        fn prop_upper_bound_exceeds_prefix(prefix in proptest::collection::vec(any::<u8>(), 1..8)) {
            if let Some(upper) = prefix_upper_bound(&prefix) {
                prop_assert!(upper.as_slice() > prefix.as_slice());
                prop_assert!(!upper.starts_with(&prefix));
            }
        }
    }
}
