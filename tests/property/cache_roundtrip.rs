//! `set(k, v); get(k) == v` for values drawn from the cache's value grammar
//! (spec §8 "Cache set(k,v); get(k) == v for any value from the value
//! grammar (primitives, lists, maps, null)"), plus the fallback-tier
//! capacity invariant (spec §8 property 5).

use mediaforge_cache::{Cache, InMemoryRemoteStore};
use proptest::prelude::*;
use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        ".*".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn set_then_get_returns_the_same_value(value in json_value()) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let cache = Cache::new(Arc::new(InMemoryRemoteStore::new()), 1000);
            cache.set_with_ttl("k", &value, None).await;
            let got: Option<Value> = cache.get("k").await;
            prop_assert_eq!(got, Some(value));
            Ok(())
        })?;
    }
}

#[tokio::test]
async fn fallback_tier_never_exceeds_its_configured_capacity() {
    // Remote tier unreachable forces every operation onto the fallback,
    // whose capacity is the thing under test (spec §8 property 5).
    let cache = Cache::new(Arc::new(mediaforge_cache::UnreachableRemoteStore), 10);
    for i in 0..500 {
        cache.set_with_ttl(&format!("k{i}"), &serde_json::json!(i), None).await;
    }
    let mut present = 0;
    for i in 0..500 {
        if cache.exists(&format!("k{i}")).await {
            present += 1;
        }
    }
    assert!(present <= 10, "fallback tier must never hold more than its configured capacity, held {present}");
}

#[tokio::test]
async fn remote_errors_are_transparent_and_increment_the_error_counter() {
    let cache = Cache::new(Arc::new(mediaforge_cache::UnreachableRemoteStore), 1000);
    cache.set_with_ttl("k", &serde_json::json!({"a": 1}), None).await;
    let got: Option<Value> = cache.get("k").await;
    assert_eq!(got, Some(serde_json::json!({"a": 1})), "get/set keep working against the fallback tier");
    let stats = cache.stats();
    assert!(stats.errors > 0, "remote-tier errors must be recorded, not swallowed silently");
}
