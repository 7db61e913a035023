//! Core infrastructure shared across mediaforge crates.
//!
//! - [`Error`] / [`Kind`]: the tagged error type every subsystem returns.
//! - [`sanitizer`]: strips sensitive fragments out of error messages at the
//!   HTTP boundary.
//! - [`events`]: observability event bus reused by the cache, circuit
//!   breaker, rate limiter, and lock crates.

pub mod canonical;
pub mod error;
pub mod events;
pub mod sanitizer;

pub use canonical::canonical_json;
pub use error::{Error, Kind, Severity};
pub use events::{EventListener, EventListeners, ResilienceEvent};
pub use sanitizer::Sanitizer;
