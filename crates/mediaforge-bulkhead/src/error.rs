//! Error types for the bulkhead pattern.

use mediaforge_core::{Error, Kind};

/// Errors that can occur when acquiring a bulkhead permit.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BulkheadError {
    /// The bulkhead rejected the call because it's at capacity.
    #[error("bulkhead '{name}' is full: max concurrent calls ({max_concurrent_calls}) reached")]
    Full {
        name: String,
        max_concurrent_calls: usize,
    },
    /// Timeout waiting for a permit.
    #[error("timed out waiting for a permit from bulkhead '{name}'")]
    Timeout { name: String },
}

impl From<BulkheadError> for Error {
    fn from(err: BulkheadError) -> Self {
        let message = err.to_string();
        match err {
            BulkheadError::Full { name, .. } => {
                Error::new(Kind::RateLimit, message).with_source_name(name)
            }
            BulkheadError::Timeout { name } => {
                Error::new(Kind::Timeout, message).with_source_name(name)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BulkheadError>;
