//! Errors returned when a call is rejected by an open circuit.
//!
//! Wraps the caller's own error type `E` so `CircuitBreaker::call` can
//! return a single error type regardless of whether the circuit rejected
//! the call or the call itself failed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    #[error("circuit '{name}' is open; call not permitted")]
    Open { name: String },

    #[error("inner call error: {0}")]
    Inner(E),
}

impl<E> CircuitBreakerError<E> {
    pub fn is_open(&self) -> bool {
        matches!(self, CircuitBreakerError::Open { .. })
    }

    pub fn into_inner(self) -> Option<E> {
        match self {
            CircuitBreakerError::Inner(e) => Some(e),
            CircuitBreakerError::Open { .. } => None,
        }
    }
}
