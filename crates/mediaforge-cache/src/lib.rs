//! Two-tier cache: a shared remote store backed by a bounded in-process
//! fallback.
//!
//! The remote tier is consulted first; on a miss, the fallback tier is
//! checked (so recently-fallback-written values survive a remote blip);
//! writes go to both tiers. Any remote-tier error is swallowed and recorded
//! in [`CacheStats`] rather than surfaced; the cache must never be the
//! reason a request fails (spec §4.A, §8 property 5/6).
//!
//! # Examples
//!
//! ```
//! use mediaforge_cache::{Cache, Category};
//! use std::sync::Arc;
//!
//! # async fn example() {
//! let cache = Cache::new(Arc::new(mediaforge_cache::InMemoryRemoteStore::new()), 1000);
//! cache.set("job:abc", &serde_json::json!({"status": "queued"}), Category::JobStatus).await;
//! let value: Option<serde_json::Value> = cache.get("job:abc").await;
//! assert_eq!(value, Some(serde_json::json!({"status": "queued"})));
//! # }
//! ```

pub mod error;
pub mod fallback;
pub mod key;
pub mod remote;
pub mod stats;
pub mod ttl;

pub use error::Error;
pub use fallback::FallbackStore;
pub use key::KeyBuilder;
pub use remote::{InMemoryRemoteStore, RemoteStore, UnreachableRemoteStore};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use ttl::Category;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const JSON_TAG: u8 = 0x01;
const BINCODE_TAG: u8 = 0x02;

fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    match serde_json::to_vec(value) {
        Ok(mut bytes) => {
            let mut out = Vec::with_capacity(bytes.len() + 1);
            out.push(JSON_TAG);
            out.append(&mut bytes);
            out
        }
        Err(_) => {
            let mut bytes = bincode::serialize(value).expect("bincode fallback always succeeds");
            let mut out = Vec::with_capacity(bytes.len() + 1);
            out.push(BINCODE_TAG);
            out.append(&mut bytes);
            out
        }
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Option<T> {
    let (tag, payload) = bytes.split_first()?;
    match *tag {
        JSON_TAG => serde_json::from_slice(payload).ok(),
        BINCODE_TAG => bincode::deserialize(payload).ok(),
        _ => None,
    }
}

/// The two-tier cache.
pub struct Cache {
    remote: Arc<dyn RemoteStore>,
    fallback: Mutex<FallbackStore>,
    stats: CacheStats,
}

impl Cache {
    pub fn new(remote: Arc<dyn RemoteStore>, fallback_capacity: usize) -> Self {
        Self {
            remote,
            fallback: Mutex::new(FallbackStore::new(fallback_capacity)),
            stats: CacheStats::new(),
        }
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    /// Reads `key`, trying the remote tier first then the fallback tier.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.remote.get(key).await {
            Ok(Some(bytes)) => {
                self.stats.record_hit();
                return decode(&bytes);
            }
            Ok(None) => {}
            Err(_) => {
                self.stats.record_error();
            }
        }

        let fallback_hit = self.fallback.lock().expect("lock poisoned").get(key);
        match fallback_hit {
            Some(bytes) => {
                self.stats.record_hit();
                decode(&bytes)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Writes `value` under `key` to both tiers using `category`'s default
    /// TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, category: Category) {
        self.set_with_ttl(key, value, Some(category.default_ttl()))
            .await;
    }

    /// Writes `value` under `key` with an explicit TTL (`None` = no expiry).
    pub async fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Option<Duration>) {
        let bytes = encode(value);
        if self.remote.set(key, bytes.clone(), ttl).await.is_err() {
            self.stats.record_error();
        }
        self.fallback
            .lock()
            .expect("lock poisoned")
            .set(key.to_string(), bytes, ttl);
        self.stats.record_set();
    }

    pub async fn delete(&self, key: &str) -> bool {
        let remote_deleted = match self.remote.delete(key).await {
            Ok(deleted) => deleted,
            Err(_) => {
                self.stats.record_error();
                false
            }
        };
        let fallback_deleted = self.fallback.lock().expect("lock poisoned").delete(key);
        self.stats.record_delete();
        remote_deleted || fallback_deleted
    }

    /// Deletes every key matching `glob` on both tiers, returning the total
    /// count removed. Applies an exact glob match on the fallback tier
    /// rather than the substring match the original service's fallback used
    /// (spec §9 Open Questions: documented as a bug to fix).
    pub async fn delete_pattern(&self, glob: &str) -> Result<usize, Error> {
        let matcher = globset::Glob::new(glob)
            .map_err(|e| error::invalid_pattern(glob, &e.to_string()))?
            .compile_matcher();

        let mut count = 0usize;
        match self.remote.keys_matching(glob).await {
            Ok(keys) => {
                for key in keys {
                    if self.remote.delete(&key).await.is_ok() {
                        count += 1;
                    }
                }
            }
            Err(_) => self.stats.record_error(),
        }

        count += self
            .fallback
            .lock()
            .expect("lock poisoned")
            .delete_matching(|k| matcher.is_match(k));

        Ok(count)
    }

    pub async fn exists(&self, key: &str) -> bool {
        match self.remote.exists(key).await {
            Ok(true) => return true,
            Ok(false) => {}
            Err(_) => self.stats.record_error(),
        }
        self.fallback.lock().expect("lock poisoned").exists(key)
    }

    /// Atomically increments `key` by `by` on the remote tier; falls back to
    /// a non-atomic read-modify-write on the fallback tier if the remote
    /// tier is unavailable.
    pub async fn increment(&self, key: &str, by: i64, ttl: Option<Duration>) -> i64 {
        match self.remote.increment(key, by, ttl).await {
            Ok(value) => value,
            Err(_) => {
                self.stats.record_error();
                let mut fallback = self.fallback.lock().expect("lock poisoned");
                let current: i64 = fallback
                    .get(key)
                    .and_then(|bytes| decode(&bytes))
                    .unwrap_or(0);
                let updated = current + by;
                fallback.set(key.to_string(), encode(&updated), ttl);
                updated
            }
        }
    }

    pub async fn clear_all(&self) {
        if self.remote.clear_all().await.is_err() {
            self.stats.record_error();
        }
        self.fallback.lock().expect("lock poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache() -> Cache {
        Cache::new(Arc::new(InMemoryRemoteStore::new()), 1000)
    }

    #[tokio::test]
    async fn set_then_get_round_trips() {
        let cache = cache();
        cache
            .set("job:abc", &json!({"status": "queued"}), Category::JobStatus)
            .await;
        let value: Option<serde_json::Value> = cache.get("job:abc").await;
        assert_eq!(value, Some(json!({"status": "queued"})));
    }

    #[tokio::test]
    async fn expired_entry_returns_absent() {
        let cache = cache();
        cache
            .set_with_ttl("job:abc", &json!({"status": "queued"}), Some(Duration::from_millis(10)))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        let value: Option<serde_json::Value> = cache.get("job:abc").await;
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn falls_back_when_remote_unreachable() {
        let cache = Cache::new(Arc::new(UnreachableRemoteStore), 1000);
        cache.set("k", &42i64, Category::Default).await;
        let value: Option<i64> = cache.get("k").await;
        assert_eq!(value, Some(42));
        assert!(cache.stats().errors > 0);
    }

    #[tokio::test]
    async fn delete_pattern_matches_glob_exactly() {
        let cache = cache();
        cache.set("job:abc:status", &1, Category::Default).await;
        cache.set("job:abcd:status", &1, Category::Default).await;
        cache.set("job:abc:progress", &1, Category::Default).await;

        let deleted = cache.delete_pattern("job:abc:*").await.unwrap();
        assert_eq!(deleted, 2);
        let remaining: Option<i32> = cache.get("job:abcd:status").await;
        assert_eq!(remaining, Some(1));
    }

    #[tokio::test]
    async fn increment_is_additive() {
        let cache = cache();
        let first = cache.increment("counter", 1, None).await;
        let second = cache.increment("counter", 1, None).await;
        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn clear_all_empties_both_tiers() {
        let cache = cache();
        cache.set("k", &1, Category::Default).await;
        cache.clear_all().await;
        let value: Option<i32> = cache.get("k").await;
        assert_eq!(value, None);
    }
}
