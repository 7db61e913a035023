//! Name-keyed registry of circuit breakers.
//!
//! One breaker per protected dependency name (e.g. `"ffmpeg"`, a storage
//! backend name); the registry lazily creates one with default config on
//! first use, grounded on the same name-keyed-map idiom used by
//! `DistributedLockManager`.

use crate::{CircuitBreaker, CircuitBreakerConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct Registry {
    breakers: Mutex<HashMap<String, Arc<CircuitBreaker>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the breaker for `name`, creating one with default config if
    /// absent.
    pub async fn get_or_default(&self, name: &str) -> Arc<CircuitBreaker> {
        self.get_or_insert_with(name, || CircuitBreakerConfig::new(name))
            .await
    }

    pub async fn get_or_insert_with(
        &self,
        name: &str,
        make_config: impl FnOnce() -> CircuitBreakerConfig,
    ) -> Arc<CircuitBreaker> {
        let mut breakers = self.breakers.lock().await;
        if let Some(breaker) = breakers.get(name) {
            return Arc::clone(breaker);
        }
        let breaker = Arc::new(CircuitBreaker::new(make_config()));
        breakers.insert(name.to_string(), Arc::clone(&breaker));
        breaker
    }
}
