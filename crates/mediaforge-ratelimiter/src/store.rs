//! Remote counter store: the atomic `incr` + `expire` path (spec §4.D).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteCounterError {
    #[error("remote counter store unreachable: {0}")]
    Unreachable(String),
}

/// Atomic increment-with-expiry counters, backed by a shared remote store
/// in production (e.g. Redis `INCR`+`EXPIRE`).
#[async_trait]
pub trait RemoteCounterStore: Send + Sync {
    /// Increments `key` by one, setting its TTL to `ttl` only if this call
    /// created the key (mirrors `INCR` + `EXPIRE NX` semantics). Returns the
    /// post-increment count.
    async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, RemoteCounterError>;
}

struct Entry {
    count: u64,
    expires_at: Instant,
}

/// In-memory stand-in for a shared counter store, used in tests and as the
/// single-process default.
#[derive(Default)]
pub struct InMemoryCounterStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RemoteCounterStore for InMemoryCounterStore {
    async fn incr(&self, key: &str, ttl: Duration) -> Result<u64, RemoteCounterError> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        let entry = entries.get_mut(key);
        match entry {
            Some(entry) if entry.expires_at > now => {
                entry.count += 1;
                Ok(entry.count)
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        count: 1,
                        expires_at: now + ttl,
                    },
                );
                Ok(1)
            }
        }
    }
}

/// Always-unreachable store, for exercising the fallback path in tests.
#[derive(Default)]
pub struct UnreachableCounterStore;

#[async_trait]
impl RemoteCounterStore for UnreachableCounterStore {
    async fn incr(&self, _key: &str, _ttl: Duration) -> Result<u64, RemoteCounterError> {
        Err(RemoteCounterError::Unreachable("simulated outage".into()))
    }
}
