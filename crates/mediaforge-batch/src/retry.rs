//! Retry policy for a failed batch child (spec §4.J: "a child may be
//! retried up to `max_retries` (default 3); each retry resets the child's
//! processing epoch but keeps identity").

use chrono::{DateTime, Utc};
use mediaforge_model::Job;

pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Whether `job`, having just failed, should be retried rather than left
/// failed. Only the retry budget matters here; the caller decides whether
/// the failure itself was retryable (e.g. not a validation error).
pub fn should_retry(job: &Job, max_retries: u32) -> bool {
    job.retry_count < max_retries
}

/// Resets `job` for another attempt if the retry budget allows it, leaving
/// it untouched (still failed) otherwise.
pub fn retry_or_leave_failed(job: &mut Job, max_retries: u32, now: DateTime<Utc>) -> bool {
    if should_retry(job, max_retries) {
        job.reset_for_retry(now);
        true
    } else {
        false
    }
}
