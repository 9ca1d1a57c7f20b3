//! Queue entry key layout.
//!
//! Entry keys are `__queue:<name>:<inserted_at_us>:<tiebreak>` with the
//! timestamp zero-padded to a fixed width, so byte-wise key order is exactly
//! `(inserted_at_us, tiebreak)` order within one queue.

use kscdb_constants::coordination::QUEUE_KEY_PREFIX;
use kscdb_constants::coordination::QUEUE_KEY_SEPARATOR;
use kscdb_constants::coordination::QUEUE_TIMESTAMP_WIDTH;

/// Why `name` cannot be used as a queue name, if it cannot.
///
/// The queue's lock lives at the bare name, so the name must itself be a
/// valid non-empty key.
pub fn queue_name_error(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("queue name must not be empty");
    }
    None
}

/// Scan prefix covering every entry of `name`.
///
/// Also covers entries of queues whose name extends `name` with a separator
/// (`a` vs `a:b`); [`parse_entry_key`] filters those out.
pub fn queue_prefix(name: &str) -> String {
    format!("{QUEUE_KEY_PREFIX}{name}{QUEUE_KEY_SEPARATOR}")
}

/// Storage key of one entry.
pub fn entry_key(name: &str, inserted_at_us: u64, tiebreak: &str) -> String {
    format!(
        "{QUEUE_KEY_PREFIX}{name}{QUEUE_KEY_SEPARATOR}{inserted_at_us:0width$}{QUEUE_KEY_SEPARATOR}{tiebreak}",
        width = QUEUE_TIMESTAMP_WIDTH
    )
}

/// Split an entry key of queue `name` into `(inserted_at_us, tiebreak)`.
///
/// Returns `None` for keys that are not entries of exactly this queue.
pub fn parse_entry_key<'a>(name: &str, key: &'a str) -> Option<(u64, &'a str)> {
    let rest = key
        .strip_prefix(QUEUE_KEY_PREFIX)?
        .strip_prefix(name)?
        .strip_prefix(QUEUE_KEY_SEPARATOR)?;
    let (timestamp, tiebreak) = rest.split_once(QUEUE_KEY_SEPARATOR)?;
    if timestamp.len() != QUEUE_TIMESTAMP_WIDTH || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if tiebreak.is_empty() || tiebreak.contains(QUEUE_KEY_SEPARATOR) {
        return None;
    }
    let inserted_at_us = timestamp.parse::<u64>().ok()?;
    Some((inserted_at_us, tiebreak))
}
