//! Per-bulkhead configuration.

use std::time::Duration;

/// Configuration for one named bulkhead.
#[derive(Debug, Clone)]
pub struct BulkheadConfig {
    pub name: String,
    /// Maximum number of concurrent calls admitted.
    pub max_concurrent_calls: usize,
    /// Maximum time to wait for a permit before rejecting. `None` waits
    /// indefinitely.
    pub max_wait_duration: Option<Duration>,
}

impl BulkheadConfig {
    pub fn new(name: impl Into<String>, max_concurrent_calls: usize) -> Self {
        Self {
            name: name.into(),
            max_concurrent_calls,
            max_wait_duration: None,
        }
    }

    pub fn max_wait_duration(mut self, duration: Duration) -> Self {
        self.max_wait_duration = Some(duration);
        self
    }
}
