//! Cache key construction.
//!
//! Mirrors the original service's `CacheKeyBuilder`: parts are joined with a
//! colon under a fixed namespace, and complex values are hashed into a
//! stable 16-character digest rather than embedded verbatim.

use sha2::{Digest, Sha256};

const NAMESPACE: &str = "mediaforge";

/// Builds namespaced cache keys from ordered parts.
///
/// Each part has colons and whitespace replaced with underscores before
/// joining, so a part can never introduce an unintended key-path separator.
pub struct KeyBuilder;

impl KeyBuilder {
    /// Joins `parts` under the fixed namespace prefix.
    pub fn build(parts: &[&str]) -> String {
        let mut joined = String::from(NAMESPACE);
        for part in parts {
            joined.push(':');
            joined.push_str(&sanitize_part(part));
        }
        joined
    }

    /// Hashes a complex value's canonical JSON encoding to a stable 16-hex
    /// digest, for keys derived from maps or sequences rather than plain
    /// strings.
    pub fn hash_value(value: &serde_json::Value) -> String {
        let canonical = mediaforge_core::canonical_json(value);
        let digest = Sha256::digest(canonical.as_bytes());
        hex_prefix(&digest, 16)
    }

    pub fn job_key(job_id: &str) -> String {
        Self::build(&["job", job_id])
    }

    pub fn job_list_key(credential_id: &str, filter_hash: &str) -> String {
        Self::build(&["job_list", credential_id, filter_hash])
    }

    pub fn api_key_validation_key(token_hash: &str) -> String {
        Self::build(&["api_key", token_hash])
    }

    pub fn storage_config_key(name: &str) -> String {
        Self::build(&["storage_config", name])
    }

    pub fn video_analysis_key(input_hash: &str) -> String {
        Self::build(&["analysis", input_hash])
    }

    pub fn rate_limit_key(identifier: &str, window: &str) -> String {
        Self::build(&["rate_limit", identifier, window])
    }
}

fn sanitize_part(part: &str) -> String {
    part.chars()
        .map(|c| if c == ':' || c.is_whitespace() { '_' } else { c })
        .collect()
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    let mut s = String::with_capacity(len);
    for byte in bytes {
        if s.len() >= len {
            break;
        }
        s.push_str(&format!("{byte:02x}"));
    }
    s.truncate(len);
    s
}
