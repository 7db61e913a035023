//! Quota boundary exactness for a resolved tier (spec §8 scenario 4): the
//! request numbered exactly at the limit still succeeds, the next one
//! fails.

use mediaforge_ratelimiter::RateLimiter;

#[tokio::test]
async fn basic_tier_allows_exactly_the_hourly_quota_then_rejects() {
    let limiter = RateLimiter::in_memory();
    let identifier = "basic_abc123";

    for n in 1..=500 {
        let decision = limiter.check(Some(identifier)).await.unwrap();
        assert!(decision.allowed, "request {n} should be within the 500/h basic quota");
        assert_eq!(decision.hourly.remaining, 500 - n as u64);
    }

    let over_limit = limiter.check(Some(identifier)).await.unwrap();
    assert!(!over_limit.allowed, "request 501 must exceed the 500/h basic quota");
}

#[tokio::test]
async fn distinct_identifiers_have_independent_quotas() {
    let limiter = RateLimiter::in_memory();
    for _ in 0..500 {
        assert!(limiter.check(Some("basic_a")).await.unwrap().allowed);
    }
    assert!(!limiter.check(Some("basic_a")).await.unwrap().allowed);

    // A different credential's quota is untouched by "basic_a" being exhausted.
    assert!(limiter.check(Some("basic_b")).await.unwrap().allowed);
}
