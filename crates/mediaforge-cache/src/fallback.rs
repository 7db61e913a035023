//! In-process fallback tier.
//!
//! Bounded map used when the remote tier is unreachable, or as the
//! secondary tier always consulted on a remote miss. Eviction is
//! earliest-expiry-first: entries without an expiry are evicted last,
//! since they carry no signal about when they stop being useful. This
//! replaces the teacher's LRU/LFU/FIFO eviction strategies, which don't
//! match the cache's actual eviction contract (capacity pressure should
//! prefer evicting what expires soonest, not what was touched least
//! recently).

use std::collections::HashMap;
use std::time::{Duration, Instant};

struct FallbackEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

/// Bounded, expiry-ordered in-process cache.
pub struct FallbackStore {
    entries: HashMap<String, FallbackEntry>,
    capacity: usize,
}

impl FallbackStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Removes every expired entry. Called on every access so expiry is
    /// enforced lazily rather than by a background sweep.
    fn prune_expired(&mut self) {
        let now = Instant::now();
        self.entries
            .retain(|_, entry| !matches!(entry.expires_at, Some(exp) if exp <= now));
    }

    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        self.prune_expired();
        self.entries.get(key).map(|e| e.value.clone())
    }

    pub fn set(&mut self, key: String, value: Vec<u8>, ttl: Option<Duration>) {
        self.prune_expired();
        let expires_at = ttl.map(|d| Instant::now() + d);
        self.entries.insert(
            key,
            FallbackEntry {
                value,
                expires_at,
            },
        );
        self.evict_over_capacity();
    }

    pub fn delete(&mut self, key: &str) -> bool {
        self.prune_expired();
        self.entries.remove(key).is_some()
    }

    pub fn exists(&mut self, key: &str) -> bool {
        self.prune_expired();
        self.entries.contains_key(key)
    }

    pub fn delete_matching<F: Fn(&str) -> bool>(&mut self, matches: F) -> usize {
        self.prune_expired();
        let keys: Vec<String> = self
            .entries
            .keys()
            .filter(|k| matches(k))
            .cloned()
            .collect();
        for key in &keys {
            self.entries.remove(key);
        }
        keys.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn evict_over_capacity(&mut self) {
        while self.entries.len() > self.capacity {
            // Entries without an expiry sort after all that have one; no
            // `Instant` arithmetic here, just a flag plus the real instant
            // so nothing can overflow.
            let victim = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.expires_at.is_none(), entry.expires_at))
                .map(|(k, _)| k.clone());
            match victim {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}
