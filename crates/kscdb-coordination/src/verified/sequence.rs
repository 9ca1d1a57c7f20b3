//! Counter key layout and value encoding.
//!
//! A counter named `n` lives at `__ids:n` and stores the decimal text of the
//! next ID to hand out. Its lock lives at `n/lock`.

use kscdb_constants::coordination::COUNTER_KEY_PREFIX;
use kscdb_constants::coordination::COUNTER_LOCK_SUFFIX;

/// Storage key of a counter.
pub fn counter_key(name: &str) -> String {
    format!("{COUNTER_KEY_PREFIX}{name}")
}

/// Lock key guarding a counter.
pub fn counter_lock_key(name: &str) -> String {
    format!("{name}{COUNTER_LOCK_SUFFIX}")
}

pub fn encode_counter(next_id: u64) -> Vec<u8> {
    next_id.to_string().into_bytes()
}

/// Parse a stored counter value. Surrounding ASCII whitespace is tolerated.
pub fn parse_counter(bytes: &[u8]) -> Result<u64, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("not UTF-8: {e}"))?;
    text.trim().parse::<u64>().map_err(|e| format!("not a u64 ({text:?}): {e}"))
}

/// Value stored after handing out `current`; `None` on overflow.
#[inline]
pub fn compute_next_id(current: u64) -> Option<u64> {
    current.checked_add(1)
}
