//! Delivery retry schedule for the webhook engine (spec §4.E).
//!
//! Not a generic exponential-backoff middleware: the spec fixes an explicit
//! delay table for the first five attempts and only falls back to
//! exponential growth past the table, so this crate models exactly that
//! instead of the teacher's configurable backoff strategies.

use std::time::Duration;

/// Delay (seconds) before each retry, indexed by attempt number (1-based,
/// i.e. the delay *before* attempt N+1 after attempt N fails).
const DELAY_SCHEDULE_SECS: [u64; 5] = [60, 300, 900, 3600, 7200];

const EXPONENTIAL_BASE_SECS: u64 = 2;
const MAX_DELAY_SECS: u64 = 86_400;

/// Maximum number of delivery attempts before giving up.
pub const MAX_ATTEMPTS: u32 = 5;

/// Delay before the next attempt, given how many attempts have already
/// been made (1 after the first failure, 2 after the second, ...).
///
/// Attempts within the fixed table use its value directly; attempts beyond
/// it grow exponentially from the table's last entry, capped at
/// [`MAX_DELAY_SECS`].
pub fn next_delay(attempts_made: u32) -> Duration {
    let index = attempts_made.saturating_sub(1) as usize;
    if let Some(&secs) = DELAY_SCHEDULE_SECS.get(index) {
        return Duration::from_secs(secs);
    }

    let overflow = index - DELAY_SCHEDULE_SECS.len() + 1;
    let secs = DELAY_SCHEDULE_SECS[DELAY_SCHEDULE_SECS.len() - 1]
        .saturating_mul(EXPONENTIAL_BASE_SECS.saturating_pow(overflow as u32))
        .min(MAX_DELAY_SECS);
    Duration::from_secs(secs)
}

/// Whether a response status warrants a retry (spec §4.E: 429 or 5xx, or a
/// network/timeout error which callers represent separately).
pub fn should_retry_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Whether a status counts as a successful delivery (spec §4.E: 2xx).
pub fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}
