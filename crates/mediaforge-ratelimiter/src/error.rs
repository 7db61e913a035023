//! Decision type returned on rejection, and conversion to the shared error.

use mediaforge_core::{Error, Kind};
use std::time::Duration;

/// Which window rejected the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Hourly,
    Daily,
}

#[derive(Debug, Clone)]
pub struct RateLimitExceeded {
    pub window: Window,
    pub limit: u64,
    pub current: u64,
    pub retry_after: Duration,
}

impl From<RateLimitExceeded> for Error {
    fn from(exceeded: RateLimitExceeded) -> Self {
        let (window, secs) = match exceeded.window {
            Window::Hourly => ("hourly", 3600),
            Window::Daily => ("daily", 86400),
        };
        Error::new(
            Kind::RateLimit,
            format!(
                "{window} rate limit exceeded: {current}/{limit}",
                current = exceeded.current,
                limit = exceeded.limit
            ),
        )
        .with_retry_after(Duration::from_secs(secs))
    }
}
