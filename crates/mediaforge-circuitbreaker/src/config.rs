//! Per-breaker configuration.

use std::time::Duration;

/// Configuration for one named circuit.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    pub name: String,
    /// Consecutive failures before tripping to open (spec default 5).
    pub failure_threshold: u32,
    /// How long the circuit stays open before admitting a half-open probe
    /// (spec default 60s).
    pub recovery_timeout: Duration,
}

impl CircuitBreakerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure_threshold: 5,
            recovery_timeout: Duration::from_secs(60),
        }
    }

    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn recovery_timeout(mut self, timeout: Duration) -> Self {
        self.recovery_timeout = timeout;
        self
    }
}
