//! Named timeouts for the service's external calls.
//!
//! Every outbound wait the spec gives a concrete number for: webhook
//! delivery (§4.E, 30s default), the cache's remote-store round trip (§4.A),
//! a blocking lock acquire (§4.B, 30s default), the media-tool invocation
//! (§4.H, duration-derived) goes through [`TimeLimiter::call`] rather than
//! a bare `tokio::time::timeout`, so a timeout always produces the same
//! tagged [`mediaforge_core::Error`] and (optionally) the same event.

use mediaforge_core::{Error, Kind};
use std::time::Duration;

/// A named timeout boundary.
#[derive(Debug, Clone)]
pub struct TimeLimiter {
    name: String,
    timeout: Duration,
}

impl TimeLimiter {
    pub fn new(name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            name: name.into(),
            timeout,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs `fut`, mapping a timeout to `Kind::Timeout`. The future's own
    /// error type must convert into `mediaforge_core::Error`.
    pub async fn call<F, T, E>(&self, fut: F) -> Result<T, Error>
    where
        F: std::future::Future<Output = Result<T, E>>,
        E: Into<Error>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(limiter = %self.name, timeout_ms = %self.timeout.as_millis(), "call timed out");

                #[cfg(feature = "metrics")]
                metrics::counter!("timelimiter_timeouts_total", "limiter" => self.name.clone())
                    .increment(1);

                Err(Error::new(
                    Kind::Timeout,
                    format!("'{}' timed out after {:?}", self.name, self.timeout),
                )
                .with_source_name(self.name.clone()))
            }
        }
    }
}
