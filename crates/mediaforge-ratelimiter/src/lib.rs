//! Two-window tiered rate limiter (spec §4.D).
//!
//! Evaluated before a submission reaches handlers: an hourly and a daily
//! counter per `(client IP ∪ credential)` identifier, checked against the
//! requester's tier quota. The happy path increments atomic remote counters
//! (`incr` + `expire`, mirroring Redis `INCR`/`EXPIRE`); when the remote
//! store is unreachable, an in-process single-window fallback takes over so
//! the service degrades instead of failing open or closed outright.
//!
//! # Examples
//!
//! ```
//! use mediaforge_ratelimiter::RateLimiter;
//!
//! # async fn example() {
//! let limiter = RateLimiter::in_memory();
//! let decision = limiter.check(Some("basic_abc123")).await.unwrap();
//! assert!(decision.allowed);
//! # }
//! ```

pub mod error;
pub mod fallback;
pub mod store;
pub mod tier;

pub use error::{RateLimitExceeded, Window};
pub use store::{InMemoryCounterStore, RemoteCounterError, RemoteCounterStore};
pub use tier::{Tier, TierQuota};

use fallback::FallbackLimiter;
use mediaforge_core::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3600);
const DAY: Duration = Duration::from_secs(86400);
const FALLBACK_CAPACITY: usize = 10_000;

/// Window usage reported back on accepted requests (spec §4.D: "Response
/// headers on accepted requests: limit and remaining for both windows.")
#[derive(Debug, Clone, Copy)]
pub struct WindowUsage {
    pub limit: u64,
    pub remaining: u64,
}

#[derive(Debug, Clone)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub tier: Tier,
    pub hourly: WindowUsage,
    pub daily: WindowUsage,
}

fn hour_key(identifier: &str) -> String {
    format!("ratelimit:hour:{identifier}")
}

fn day_key(identifier: &str) -> String {
    format!("ratelimit:day:{identifier}")
}

pub struct RateLimiter {
    remote: Arc<dyn RemoteCounterStore>,
    fallback: Mutex<FallbackLimiter>,
}

impl RateLimiter {
    pub fn new(remote: Arc<dyn RemoteCounterStore>) -> Self {
        Self {
            remote,
            fallback: Mutex::new(FallbackLimiter::new(HOUR, FALLBACK_CAPACITY)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryCounterStore::new()))
    }

    /// Checks and consumes one unit of quota for `identifier` (the
    /// credential, or `None` for an anonymous/IP-keyed request).
    ///
    /// Tries the atomic remote path first; on remote failure, degrades to
    /// the in-process hourly-only fallback rather than rejecting outright.
    pub async fn check(&self, identifier: Option<&str>) -> Result<RateLimitDecision, Error> {
        let tier = Tier::for_request(identifier);
        let quota = tier.quota();
        let key_id = identifier.unwrap_or("anonymous");

        let decision = match self.check_remote(key_id, quota).await {
            Ok(decision) => decision,
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(identifier = %key_id, "remote rate limit store unreachable, using fallback");
                self.check_fallback(key_id, tier, quota)
            }
        };

        #[cfg(feature = "metrics")]
        metrics::counter!(
            "ratelimiter_checks_total",
            "allowed" => decision.allowed.to_string()
        )
        .increment(1);

        Ok(decision)
    }

    async fn check_remote(
        &self,
        key_id: &str,
        quota: TierQuota,
    ) -> Result<RateLimitDecision, RemoteCounterError> {
        let hourly_count = self.remote.incr(&hour_key(key_id), HOUR).await?;
        let daily_count = self.remote.incr(&day_key(key_id), DAY).await?;

        let allowed = hourly_count <= quota.hourly_limit && daily_count <= quota.daily_limit;

        Ok(RateLimitDecision {
            allowed,
            tier: Tier::for_request(Some(key_id)),
            hourly: WindowUsage {
                limit: quota.hourly_limit,
                remaining: quota.hourly_limit.saturating_sub(hourly_count),
            },
            daily: WindowUsage {
                limit: quota.daily_limit,
                remaining: quota.daily_limit.saturating_sub(daily_count),
            },
        })
    }

    fn check_fallback(&self, key_id: &str, tier: Tier, quota: TierQuota) -> RateLimitDecision {
        let count = self.fallback.lock().unwrap().incr(key_id);
        let allowed = count <= quota.hourly_limit;
        RateLimitDecision {
            allowed,
            tier,
            hourly: WindowUsage {
                limit: quota.hourly_limit,
                remaining: quota.hourly_limit.saturating_sub(count),
            },
            // The fallback only tracks one (hourly) window; report the
            // daily limit unconsumed rather than guessing at daily usage.
            daily: WindowUsage {
                limit: quota.daily_limit,
                remaining: quota.daily_limit,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::UnreachableCounterStore;

    #[tokio::test]
    async fn allows_requests_within_quota() {
        let limiter = RateLimiter::in_memory();
        let decision = limiter.check(Some("basic_abc")).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.hourly.limit, 500);
        assert_eq!(decision.hourly.remaining, 499);
    }

    #[tokio::test]
    async fn rejects_once_hourly_quota_exceeded() {
        let limiter = RateLimiter::in_memory();
        for _ in 0..100 {
            let _ = limiter.check(None).await.unwrap();
        }
        let decision = limiter.check(None).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.tier, Tier::Free);
    }

    #[tokio::test]
    async fn tier_resolves_from_prefix() {
        let limiter = RateLimiter::in_memory();
        let decision = limiter.check(Some("ent_xyz")).await.unwrap();
        assert_eq!(decision.hourly.limit, 10_000);
    }

    #[tokio::test]
    async fn falls_back_when_remote_unreachable() {
        let limiter = RateLimiter::new(Arc::new(UnreachableCounterStore));
        let decision = limiter.check(Some("basic_abc")).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.hourly.remaining, 499);
    }
}
