//! HMAC-SHA256 payload signing (spec §4.E / §6 "Signature header").

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Signs the canonical JSON encoding of `payload` with `secret`, producing
/// the hex digest carried in `X-Webhook-Signature: sha256=<digest>`.
pub fn sign(secret: &str, payload: &serde_json::Value) -> String {
    let canonical = mediaforge_core::canonical_json(payload);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(canonical.as_bytes());
    mac.finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Formats the full header value.
pub fn header_value(secret: &str, payload: &serde_json::Value) -> String {
    format!("sha256={}", sign(secret, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn signature_is_deterministic() {
        let payload = json!({"b": 1, "a": 2});
        let first = sign("secret", &payload);
        let second = sign("secret", &payload);
        assert_eq!(first, second);
    }

    #[test]
    fn key_order_does_not_affect_signature() {
        let a = sign("secret", &json!({"a": 1, "b": 2}));
        let b = sign("secret", &json!({"b": 2, "a": 1}));
        assert_eq!(a, b);
    }

    #[test]
    fn different_secrets_produce_different_signatures() {
        let payload = json!({"a": 1});
        assert_ne!(sign("secret-1", &payload), sign("secret-2", &payload));
    }

    #[test]
    fn header_value_is_prefixed() {
        let header = header_value("secret", &json!({"a": 1}));
        assert!(header.starts_with("sha256="));
    }
}
