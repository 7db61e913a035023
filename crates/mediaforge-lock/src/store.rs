//! Remote store abstraction the lock is built on.
//!
//! Mirrors the Redis primitives `api/utils/distributed_lock.py` relies on:
//! atomic "set if absent with TTL" for acquire, and a compare-and-delete /
//! compare-and-extend pair (Lua scripts in the original) for release and
//! extend. Modeled as a trait so production code can point at a real
//! backend while tests use an in-memory double.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("lock store unreachable: {0}")]
    Unreachable(String),
}

/// Sentinel TTL meaning "never expires", used by the orphan sweeper to spot
/// locks that were set without an expiry and should not exist.
pub const NEVER_EXPIRES: Option<Duration> = None;

#[async_trait]
pub trait LockStore: Send + Sync {
    /// Atomically sets `key` to `token` with `ttl`, only if `key` is absent.
    /// Returns `true` if the set happened.
    async fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Atomically deletes `key` only if its current value equals `token`.
    /// Returns `true` if the delete happened.
    async fn compare_delete(&self, key: &str, token: &str) -> Result<bool, StoreError>;

    /// Atomically resets `key`'s TTL to `ttl` only if its current value
    /// equals `token`.
    async fn compare_extend(&self, key: &str, token: &str, ttl: Duration) -> Result<bool, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;

    /// Lists every currently-live lock key, paired with whether it carries
    /// an expiry. Used by the orphan sweeper.
    async fn list_keys(&self) -> Result<Vec<(String, bool)>, StoreError>;
}

struct Entry {
    token: String,
    expires_at: Option<Instant>,
}

/// In-memory `LockStore` used by tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryLockStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_live(entry: &Entry) -> bool {
        !matches!(entry.expires_at, Some(exp) if exp <= Instant::now())
    }
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    async fn set_if_absent(&self, key: &str, token: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        entries.retain(|_, e| Self::is_live(e));
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                token: token.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(true)
    }

    async fn compare_delete(&self, key: &str, token: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        match entries.get(key) {
            Some(entry) if entry.token == token => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn compare_extend(&self, key: &str, token: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().expect("lock poisoned");
        match entries.get_mut(key) {
            Some(entry) if entry.token == token => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().expect("lock poisoned");
        Ok(entries
            .get(key)
            .filter(|e| Self::is_live(e))
            .map(|e| e.token.clone()))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let entries = self.entries.lock().expect("lock poisoned");
        Ok(entries.get(key).and_then(|e| {
            e.expires_at.map(|exp| exp.saturating_duration_since(Instant::now()))
        }))
    }

    async fn list_keys(&self) -> Result<Vec<(String, bool)>, StoreError> {
        let entries = self.entries.lock().expect("lock poisoned");
        Ok(entries
            .iter()
            .filter(|(_, e)| Self::is_live(e))
            .map(|(k, e)| (k.clone(), e.expires_at.is_some()))
            .collect())
    }
}
