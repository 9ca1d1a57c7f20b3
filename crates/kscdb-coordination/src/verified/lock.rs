//! Lock record encoding and lease arithmetic.
//!
//! A lock record is the holder's token as UTF-8 text. With a lease the
//! deadline is appended: `"<token>@<deadline_unix_ms>"`. A record without a
//! trailing `@<digits>` suffix never expires, which keeps records written by
//! lease-less clients compatible.

use kscdb_constants::coordination::LOCK_LEASE_SEPARATOR;

use crate::types::LockRecord;

/// Encode a lock record.
pub fn encode_lock_record(token: &str, lease_deadline_ms: Option<u64>) -> Vec<u8> {
    match lease_deadline_ms {
        Some(deadline) => format!("{token}{LOCK_LEASE_SEPARATOR}{deadline}").into_bytes(),
        None => token.as_bytes().to_vec(),
    }
}

/// Decode a lock record.
///
/// Never fails: bytes that are not valid UTF-8 decode lossily into a token
/// that cannot match any generated token.
pub fn parse_lock_record(bytes: &[u8]) -> LockRecord {
    let text = String::from_utf8_lossy(bytes);
    if let Some((token, deadline)) = text.rsplit_once(LOCK_LEASE_SEPARATOR)
        && !deadline.is_empty()
        && deadline.bytes().all(|b| b.is_ascii_digit())
        && let Ok(deadline_ms) = deadline.parse::<u64>()
    {
        return LockRecord {
            token: token.to_owned(),
            lease_deadline_ms: Some(deadline_ms),
        };
    }
    LockRecord {
        token: text.into_owned(),
        lease_deadline_ms: None,
    }
}

/// Deadline for a lease starting at `now_ms`.
#[inline]
pub fn compute_lease_deadline(now_ms: u64, ttl_ms: u64) -> u64 {
    now_ms.saturating_add(ttl_ms)
}

/// A lease is expired once `now_ms` has passed its deadline. No lease, no expiry.
#[inline]
pub fn is_lease_expired(lease_deadline_ms: Option<u64>, now_ms: u64) -> bool {
    lease_deadline_ms.is_some_and(|deadline| now_ms > deadline)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn plain_token_has_no_lease() {
        let record = parse_lock_record(b"0b8f-token");
        assert_eq!(record.token, "0b8f-token");
        assert_eq!(record.lease_deadline_ms, None);
    }

    #[test]
    fn leased_record_roundtrip() {
        let bytes = encode_lock_record("tok", Some(1_700_000_000_000));
        assert_eq!(bytes, b"tok@1700000000000");
        let record = parse_lock_record(&bytes);
        assert_eq!(record.token, "tok");
        assert_eq!(record.lease_deadline_ms, Some(1_700_000_000_000));
    }

    #[test]
    fn non_numeric_suffix_is_part_of_token() {
        let record = parse_lock_record(b"user@example");
        assert_eq!(record.token, "user@example");
        assert_eq!(record.lease_deadline_ms, None);

        let record = parse_lock_record(b"trailing@");
        assert_eq!(record.token, "trailing@");
    }

    #[test]
    fn invalid_utf8_never_matches_a_token() {
        let record = parse_lock_record(&[0xff, 0xfe]);
        assert_eq!(record.lease_deadline_ms, None);
        assert!(record.token.contains('\u{fffd}'));
    }

    #[test]
    fn lease_expiry() {
        assert!(!is_lease_expired(None, u64::MAX));
        assert!(!is_lease_expired(Some(1_000), 1_000));
        assert!(is_lease_expired(Some(1_000), 1_001));
        assert_eq!(compute_lease_deadline(u64::MAX, 5), u64::MAX);
    }

    proptest! {
        #[test]
        fn prop_uuid_records_roundtrip(deadline in proptest::option::of(any::<u64>())) {
            let token = uuid::Uuid::new_v4().to_string();
            let record = parse_lock_record(&encode_lock_record(&token, deadline));
            prop_assert_eq!(record.token, token);
            prop_assert_eq!(record.lease_deadline_ms, deadline);
        }
    }
}
