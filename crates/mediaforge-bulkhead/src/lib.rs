//! Concurrency-limiting bulkhead.
//!
//! Caps the number of in-flight calls against one resource: a tier's
//! concurrent job count (spec §4.D `max_concurrent_jobs`), or a batch's `K`
//! concurrency cap (spec §4.J). Semaphore-based: acquiring a permit returns
//! an RAII guard that releases the slot on drop.
//!
//! # Examples
//!
//! ```
//! use mediaforge_bulkhead::{Bulkhead, BulkheadConfig};
//!
//! # async fn example() {
//! let bulkhead = Bulkhead::new(BulkheadConfig::new("premium", 2));
//! let _permit = bulkhead.acquire().await.unwrap();
//! assert_eq!(bulkhead.available_permits(), 1);
//! # }
//! ```

pub mod config;
pub mod error;
pub mod registry;

pub use config::BulkheadConfig;
pub use error::{BulkheadError, Result};
pub use registry::Registry;

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A held permit. Releases its slot back to the bulkhead when dropped.
pub struct BulkheadPermit {
    _permit: OwnedSemaphorePermit,
}

pub struct Bulkhead {
    config: BulkheadConfig,
    semaphore: Arc<Semaphore>,
}

impl Bulkhead {
    pub fn new(config: BulkheadConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_calls));
        Self { config, semaphore }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Acquires a permit, waiting up to `max_wait_duration` if configured
    /// (or indefinitely if not).
    pub async fn acquire(&self) -> Result<BulkheadPermit> {
        let acquire = self.semaphore.clone().acquire_owned();
        let permit = match self.config.max_wait_duration {
            Some(wait) => tokio::time::timeout(wait, acquire)
                .await
                .map_err(|_| BulkheadError::Timeout {
                    name: self.config.name.clone(),
                })?
                .map_err(|_| BulkheadError::Full {
                    name: self.config.name.clone(),
                    max_concurrent_calls: self.config.max_concurrent_calls,
                })?,
            None => acquire.await.map_err(|_| BulkheadError::Full {
                name: self.config.name.clone(),
                max_concurrent_calls: self.config.max_concurrent_calls,
            })?,
        };

        #[cfg(feature = "metrics")]
        metrics::gauge!(
            "bulkhead_concurrent_calls",
            "bulkhead" => self.config.name.clone()
        )
        .set((self.config.max_concurrent_calls - self.semaphore.available_permits()) as f64);

        Ok(BulkheadPermit { _permit: permit })
    }

    /// Non-blocking acquire: rejects immediately if no permit is free.
    pub fn try_acquire(&self) -> Result<BulkheadPermit> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .map(|permit| BulkheadPermit { _permit: permit })
            .map_err(|_| BulkheadError::Full {
                name: self.config.name.clone(),
                max_concurrent_calls: self.config.max_concurrent_calls,
            })
    }
}
