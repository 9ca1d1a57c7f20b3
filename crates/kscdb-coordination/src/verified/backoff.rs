//! Exponential backoff with additive jitter.

use kscdb_constants::coordination::LOCK_MIN_BACKOFF_MS;

/// One step of the backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffStep {
    /// Sleep duration in milliseconds (includes jitter).
    pub sleep_ms: u64,
    /// Base delay for the following step.
    pub next_backoff_ms: u64,
}

/// Compute the sleep for the current step and the base delay for the next.
///
/// Delays below [`LOCK_MIN_BACKOFF_MS`] are raised to it, so a zero configuration
/// still sleeps. Jitter is `jitter_seed % (current / 2 + 1)`, so the sleep lies
/// in `[current, current + current / 2]`. The next base delay doubles and is
/// capped at `max_backoff_ms`.
#[inline]
pub fn compute_backoff_step(current_backoff_ms: u64, max_backoff_ms: u64, jitter_seed: u64) -> BackoffStep {
    let current = current_backoff_ms.max(LOCK_MIN_BACKOFF_MS);
    let jitter_span = current.saturating_div(2).saturating_add(1);
    let sleep_ms = current.saturating_add(jitter_seed % jitter_span);
    let next_backoff_ms = current.saturating_mul(2).min(max_backoff_ms).max(LOCK_MIN_BACKOFF_MS);
    BackoffStep {
        sleep_ms,
        next_backoff_ms,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn doubles_until_cap() {
        let mut current = 2;
        let mut seen = Vec::new();
        for _ in 0..10 {
            let step = compute_backoff_step(current, 100, 0);
            seen.push(step.sleep_ms);
            current = step.next_backoff_ms;
        }
        assert_eq!(seen, [2, 4, 8, 16, 32, 64, 100, 100, 100, 100]);
    }

    #[test]
    fn zero_backoff_still_sleeps() {
        let step = compute_backoff_step(0, 100, 12345);
        assert_eq!(step.sleep_ms, 1);
        assert_eq!(step.next_backoff_ms, 2);

        let step = compute_backoff_step(0, 0, 0);
        assert_eq!(step.sleep_ms, 1);
        assert_eq!(step.next_backoff_ms, 1);
    }

    #[test]
    fn no_overflow_at_extremes() {
        let step = compute_backoff_step(u64::MAX, u64::MAX, u64::MAX);
        assert_eq!(step.next_backoff_ms, u64::MAX);
        assert_eq!(step.sleep_ms, u64::MAX);
    }

    proptest! {
        #[test]
        fn prop_jitter_bounded(current in 0u64..1_000_000, max in 0u64..1_000_000, seed in any::<u64>()) {
            let step = compute_backoff_step(current, max, seed);
            let floor = current.max(LOCK_MIN_BACKOFF_MS);
            prop_assert!(step.sleep_ms >= floor);
            prop_assert!(step.sleep_ms <= floor + floor / 2);
            prop_assert!(step.next_backoff_ms >= LOCK_MIN_BACKOFF_MS);
            prop_assert!(step.next_backoff_ms <= max.max(LOCK_MIN_BACKOFF_MS));
        }
    }
}
