//! The API credential entity (spec §3 "API Credential").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Mirrors `mediaforge_ratelimiter::Tier` one-to-one; kept separate (rather
/// than reused directly) so this crate's persisted model doesn't pull in
/// the rate limiter's quota tables as a dependency. Convert with
/// [`Tier::quota_tier`] at the call sites that need the quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Free,
    Basic,
    Premium,
    Enterprise,
}

impl Default for Tier {
    fn default() -> Self {
        Tier::Free
    }
}

impl Tier {
    pub fn quota_tier(self) -> mediaforge_ratelimiter::Tier {
        match self {
            Tier::Free => mediaforge_ratelimiter::Tier::Free,
            Tier::Basic => mediaforge_ratelimiter::Tier::Basic,
            Tier::Premium => mediaforge_ratelimiter::Tier::Premium,
            Tier::Enterprise => mediaforge_ratelimiter::Tier::Enterprise,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiCredential {
    pub id: String,
    /// Keyed hash of the secret, never the secret itself (spec §3 "stored
    /// only as a keyed hash").
    pub secret_hash: String,
    pub tier: Tier,
    pub active: bool,
    pub admin: bool,
    /// Caps how many of this credential's jobs may be non-terminal at once
    /// (spec §4.K "enforce concurrency cap"), grounded on `api/routers/
    /// api_keys.py`'s `max_concurrent_jobs` field (default 5, range 1-100).
    pub max_concurrent_jobs: u32,
    pub revoked_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// The `api_keys.py` request default (`Field(5, ge=1, le=100)`).
pub const DEFAULT_MAX_CONCURRENT_JOBS: u32 = 5;

impl ApiCredential {
    /// Usable iff active, not revoked, and not expired (spec §3 lifecycle
    /// predicate).
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.active
            && self.revoked_at.is_none()
            && match self.expires_at {
                Some(expires) => expires > now,
                None => true,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(active: bool, revoked: bool, expires_at: Option<DateTime<Utc>>) -> ApiCredential {
        ApiCredential {
            id: "cred1".to_string(),
            secret_hash: "hash".to_string(),
            tier: Tier::Basic,
            active,
            admin: false,
            max_concurrent_jobs: DEFAULT_MAX_CONCURRENT_JOBS,
            revoked_at: if revoked { Some(DateTime::from_timestamp(1, 0).unwrap()) } else { None },
            expires_at,
            created_at: DateTime::from_timestamp(0, 0).unwrap(),
        }
    }

    #[test]
    fn inactive_credential_is_unusable() {
        assert!(!credential(false, false, None).is_usable(DateTime::from_timestamp(100, 0).unwrap()));
    }

    #[test]
    fn revoked_credential_is_unusable() {
        assert!(!credential(true, true, None).is_usable(DateTime::from_timestamp(100, 0).unwrap()));
    }

    #[test]
    fn expired_credential_is_unusable() {
        let expires = DateTime::from_timestamp(50, 0).unwrap();
        assert!(!credential(true, false, Some(expires)).is_usable(DateTime::from_timestamp(100, 0).unwrap()));
    }

    #[test]
    fn active_unexpired_credential_is_usable() {
        let expires = DateTime::from_timestamp(200, 0).unwrap();
        assert!(credential(true, false, Some(expires)).is_usable(DateTime::from_timestamp(100, 0).unwrap()));
    }

    #[test]
    fn no_expiry_means_never_expires() {
        assert!(credential(true, false, None).is_usable(DateTime::from_timestamp(i64::MAX / 2, 0).unwrap()));
    }
}
