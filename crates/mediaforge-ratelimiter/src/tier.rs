//! Subscription tiers and their quota tables.

/// A subscription tier, resolved from a credential's identifier prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Free,
    Basic,
    Premium,
    Enterprise,
}

/// Per-tier limits: call quotas plus the concurrency and input-size caps
/// enforced elsewhere (bulkhead, upload validation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierQuota {
    pub hourly_limit: u64,
    pub daily_limit: u64,
    pub max_concurrent_jobs: u32,
    pub max_file_size_bytes: u64,
}

impl Tier {
    /// Infers a tier from a credential identifier's prefix. An identifier
    /// with no recognized prefix still counts as a credential and defaults
    /// to basic; the absence of any credential (anonymous/IP-keyed request)
    /// is the caller's responsibility to map to `Tier::Free` before calling
    /// this; see [`Tier::for_request`].
    pub fn from_identifier(identifier: &str) -> Self {
        if identifier.starts_with("ent_") {
            Tier::Enterprise
        } else if identifier.starts_with("prem_") {
            Tier::Premium
        } else if identifier.starts_with("basic_") {
            Tier::Basic
        } else {
            Tier::Basic
        }
    }

    /// Resolves a tier for a request: `None` (no credential, IP-keyed) maps
    /// to free; `Some(identifier)` maps via [`Tier::from_identifier`].
    pub fn for_request(identifier: Option<&str>) -> Self {
        match identifier {
            Some(id) => Self::from_identifier(id),
            None => Tier::Free,
        }
    }

    pub fn quota(self) -> TierQuota {
        match self {
            Tier::Free => TierQuota {
                hourly_limit: 100,
                daily_limit: 1_000,
                max_concurrent_jobs: 1,
                max_file_size_bytes: 500 * 1024 * 1024,
            },
            Tier::Basic => TierQuota {
                hourly_limit: 500,
                daily_limit: 5_000,
                max_concurrent_jobs: 3,
                max_file_size_bytes: 2 * 1024 * 1024 * 1024,
            },
            Tier::Premium => TierQuota {
                hourly_limit: 2_000,
                daily_limit: 20_000,
                max_concurrent_jobs: 10,
                max_file_size_bytes: 10 * 1024 * 1024 * 1024,
            },
            Tier::Enterprise => TierQuota {
                hourly_limit: 10_000,
                daily_limit: 100_000,
                max_concurrent_jobs: 50,
                max_file_size_bytes: 50 * 1024 * 1024 * 1024,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_resolve_to_expected_tiers() {
        assert_eq!(Tier::from_identifier("ent_abc"), Tier::Enterprise);
        assert_eq!(Tier::from_identifier("prem_abc"), Tier::Premium);
        assert_eq!(Tier::from_identifier("basic_abc"), Tier::Basic);
        assert_eq!(Tier::from_identifier("abc123"), Tier::Basic);
    }

    #[test]
    fn absent_credential_is_free() {
        assert_eq!(Tier::for_request(None), Tier::Free);
    }

    #[test]
    fn quotas_match_defaults() {
        assert_eq!(Tier::Free.quota().hourly_limit, 100);
        assert_eq!(Tier::Free.quota().daily_limit, 1_000);
        assert_eq!(Tier::Enterprise.quota().hourly_limit, 10_000);
        assert_eq!(Tier::Enterprise.quota().daily_limit, 100_000);
    }
}
