//! Shared error type for mediaforge.
//!
//! Every subsystem (cache, lock, circuit breaker, rate limiter, webhook
//! engine, command builder, worker pipeline, quality analyzer, batch
//! coordinator, orchestrator, HTTP surface) reports failures through
//! [`Error`], a single tagged error carrying a [`Kind`] instead of a
//! per-subsystem exception hierarchy. This mirrors the same "zero manual
//! `From` impls" idea the old `ResilienceError<E>` wrapper used to provide
//! for composed Tower layers, specialized to the eleven error kinds this
//! service actually distinguishes.
//!
//! # Example
//!
//! ```
//! use mediaforge_core::{Error, Kind};
//!
//! let err = Error::new(Kind::Validation, "trim.duration must be > 0");
//! assert_eq!(err.kind(), Kind::Validation);
//! assert!(err.to_string().contains("trim.duration"));
//! ```

use std::fmt;
use std::time::Duration;

/// Category of failure. Matches spec §7 exactly; do not add variants without
/// updating the sanitizer and the HTTP error-envelope mapping in
/// `mediaforge-api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Validation,
    Security,
    Authentication,
    Authorization,
    RateLimit,
    Processing,
    Storage,
    Network,
    Timeout,
    Configuration,
    Internal,
}

impl Kind {
    /// Standard error code used in the HTTP error envelope (spec §6).
    pub fn code(self) -> &'static str {
        match self {
            Kind::Validation => "VALIDATION_FAILED",
            Kind::Security => "SECURITY_VIOLATION",
            Kind::Authentication => "ACCESS_DENIED",
            Kind::Authorization => "ACCESS_DENIED",
            Kind::RateLimit => "RATE_LIMIT_EXCEEDED",
            Kind::Processing => "PROCESSING_FAILED",
            Kind::Storage => "FILE_NOT_FOUND",
            Kind::Network => "PROCESSING_FAILED",
            Kind::Timeout => "PROCESSING_FAILED",
            Kind::Configuration => "INTERNAL_ERROR",
            Kind::Internal => "INTERNAL_ERROR",
        }
    }

    /// Severity level used to decide whether debug-mode detail may be
    /// attached (spec §7: "low/medium-severity errors may include sanitized
    /// details... high/critical errors never include details").
    pub fn severity(self) -> Severity {
        match self {
            Kind::Validation | Kind::RateLimit => Severity::Low,
            Kind::Storage | Kind::Network | Kind::Timeout => Severity::Medium,
            Kind::Authentication | Kind::Authorization | Kind::Processing => Severity::High,
            Kind::Security | Kind::Configuration | Kind::Internal => Severity::Critical,
        }
    }
}

/// Severity used to gate how much detail an error may carry externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A tagged error carrying a [`Kind`], a human-readable (pre-sanitization)
/// message, and optional structured context used by a few kinds (rate-limit
/// retry hints, circuit-breaker identity).
#[derive(Debug, Clone)]
pub struct Error {
    kind: Kind,
    message: String,
    retry_after: Option<Duration>,
    source_name: Option<String>,
}

impl Error {
    /// Builds a new error of the given kind.
    pub fn new(kind: Kind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
            source_name: None,
        }
    }

    /// Attaches a retry-after hint (used by rate-limit and circuit-open
    /// responses).
    pub fn with_retry_after(mut self, retry_after: Duration) -> Self {
        self.retry_after = Some(retry_after);
        self
    }

    /// Attaches the name of the resource that produced the error (e.g. the
    /// circuit breaker name, the lock key).
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == Kind::RateLimit
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == Kind::Timeout
    }

    pub fn is_security(&self) -> bool {
        self.kind == Kind::Security
    }

    /// Shorthand constructors for the kinds used most often outside this
    /// crate; saves every call site from spelling out `Error::new(Kind::X,
    /// ...)`.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(Kind::Validation, message)
    }

    pub fn security(message: impl Into<String>) -> Self {
        Self::new(Kind::Security, message)
    }

    pub fn processing(message: impl Into<String>) -> Self {
        Self::new(Kind::Processing, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(Kind::Storage, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Kind::Internal, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(Kind::Timeout, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(Kind::Authentication, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(Kind::Authorization, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(Kind::RateLimit, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(Kind::Network, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(Kind::Configuration, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source_name.as_deref() {
            Some(name) => write!(f, "{:?} ({name}): {}", self.kind, self.message),
            None => write!(f, "{:?}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for Error {}

const _: () = {
    const fn assert_send_sync_static<T: Send + Sync + 'static>() {}
    assert_send_sync_static::<Error>();
};
