//! Remote tier abstraction.
//!
//! The remote tier is a shared key/value store (Redis in the original
//! service). Modeled as a trait so production code talks to a real backend
//! while tests inject an in-memory double, per the design note on making
//! every external dependency an interface with production and test
//! implementations rather than import-time branching.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Errors from the remote tier. Any of these causes the caller to fall back
/// to the in-process tier transparently.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("remote store unreachable: {0}")]
    Unreachable(String),
    #[error("remote store operation failed: {0}")]
    Operation(String),
}

/// The primary, shared cache tier.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RemoteError>;
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), RemoteError>;
    async fn delete(&self, key: &str) -> Result<bool, RemoteError>;
    async fn exists(&self, key: &str) -> Result<bool, RemoteError>;
    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, RemoteError>;
    async fn increment(&self, key: &str, by: i64, ttl: Option<Duration>) -> Result<i64, RemoteError>;
    async fn clear_all(&self) -> Result<(), RemoteError>;
}

struct StoredValue {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

/// In-memory `RemoteStore` used by tests and by any deployment that omits a
/// shared cache backend.
#[derive(Default)]
pub struct InMemoryRemoteStore {
    data: Mutex<HashMap<String, StoredValue>>,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_live(entry: &StoredValue) -> bool {
        !matches!(entry.expires_at, Some(exp) if exp <= Instant::now())
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RemoteError> {
        let data = self.data.lock().expect("lock poisoned");
        Ok(data
            .get(key)
            .filter(|e| Self::is_live(e))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<(), RemoteError> {
        let mut data = self.data.lock().expect("lock poisoned");
        data.insert(
            key.to_string(),
            StoredValue {
                value,
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, RemoteError> {
        let mut data = self.data.lock().expect("lock poisoned");
        Ok(data.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, RemoteError> {
        let data = self.data.lock().expect("lock poisoned");
        Ok(data.get(key).is_some_and(Self::is_live))
    }

    async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, RemoteError> {
        let data = self.data.lock().expect("lock poisoned");
        let glob = globset::Glob::new(pattern)
            .map_err(|e| RemoteError::Operation(e.to_string()))?
            .compile_matcher();
        Ok(data
            .iter()
            .filter(|(_, e)| Self::is_live(e))
            .filter(|(k, _)| glob.is_match(k.as_str()))
            .map(|(k, _)| k.clone())
            .collect())
    }

    async fn increment(&self, key: &str, by: i64, ttl: Option<Duration>) -> Result<i64, RemoteError> {
        let mut data = self.data.lock().expect("lock poisoned");
        let current = data
            .get(key)
            .filter(|e| Self::is_live(e))
            .map(|e| {
                std::str::from_utf8(&e.value)
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .unwrap_or(0)
            })
            .unwrap_or(0);
        let updated = current + by;
        data.insert(
            key.to_string(),
            StoredValue {
                value: updated.to_string().into_bytes(),
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(updated)
    }

    async fn clear_all(&self) -> Result<(), RemoteError> {
        let mut data = self.data.lock().expect("lock poisoned");
        data.clear();
        Ok(())
    }
}

/// A remote store double that always errors, for exercising the fallback
/// path in tests.
#[derive(Default)]
pub struct UnreachableRemoteStore;

#[async_trait]
impl RemoteStore for UnreachableRemoteStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, RemoteError> {
        Err(RemoteError::Unreachable("simulated outage".into()))
    }
    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Option<Duration>) -> Result<(), RemoteError> {
        Err(RemoteError::Unreachable("simulated outage".into()))
    }
    async fn delete(&self, _key: &str) -> Result<bool, RemoteError> {
        Err(RemoteError::Unreachable("simulated outage".into()))
    }
    async fn exists(&self, _key: &str) -> Result<bool, RemoteError> {
        Err(RemoteError::Unreachable("simulated outage".into()))
    }
    async fn keys_matching(&self, _pattern: &str) -> Result<Vec<String>, RemoteError> {
        Err(RemoteError::Unreachable("simulated outage".into()))
    }
    async fn increment(&self, _key: &str, _by: i64, _ttl: Option<Duration>) -> Result<i64, RemoteError> {
        Err(RemoteError::Unreachable("simulated outage".into()))
    }
    async fn clear_all(&self) -> Result<(), RemoteError> {
        Err(RemoteError::Unreachable("simulated outage".into()))
    }
}
