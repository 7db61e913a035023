//! `canonical(canonical(x)) == canonical(x)` and HMAC signature
//! recomputation equality, across randomly generated JSON objects (spec §8
//! "Canonical JSON: canonical(canonical(x)) == canonical(x); signature
//! recomputation equals the original").

use mediaforge_core::canonical_json;
use proptest::prelude::*;
use serde_json::Value;

/// A bounded strategy for JSON-like values: recursion depth 3, at most 6
/// object/array entries per level. Wide enough to exercise nested objects
/// and arrays without proptest spending all its time on pathological trees.
fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        ".*".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn canonical_encoding_is_idempotent(value in json_value()) {
        let once = canonical_json(&value);
        let reparsed: Value = serde_json::from_str(&once).unwrap();
        let twice = canonical_json(&reparsed);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn canonical_encoding_is_insensitive_to_source_key_order(value in json_value()) {
        // Round-tripping through a BTreeMap-backed object (sorted) must
        // match round-tripping through the original insertion order.
        let a = canonical_json(&value);
        let shuffled = reverse_object_keys(&value);
        let b = canonical_json(&shuffled);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn signature_recomputation_matches_independent_of_key_order(value in json_value()) {
        let secret = "shared-secret";
        let a = mediaforge_webhook::signature::sign(secret, &value);
        let shuffled = reverse_object_keys(&value);
        let b = mediaforge_webhook::signature::sign(secret, &shuffled);
        prop_assert_eq!(a, b);
    }
}

/// Rebuilds every object in `value` with its keys inserted in reverse
/// order, to prove canonical encoding doesn't depend on insertion order.
fn reverse_object_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut rebuilt = serde_json::Map::new();
            for (k, v) in map.iter().rev() {
                rebuilt.insert(k.clone(), reverse_object_keys(v));
            }
            Value::Object(rebuilt)
        }
        Value::Array(items) => Value::Array(items.iter().map(reverse_object_keys).collect()),
        other => other.clone(),
    }
}
