//! Error types for the cache crate.
//!
//! Cache operations never surface remote-tier errors to the caller; they
//! fall back silently and bump [`crate::CacheStats`] instead (spec §4.A).
//! This module exists only for the narrow set of inputs the cache itself
//! rejects outright, such as a malformed glob pattern.

pub use mediaforge_core::{Error, Kind};

/// Builds a [`Kind::Validation`] error for a cache-level input problem.
pub fn invalid_pattern(pattern: &str, reason: &str) -> Error {
    Error::validation(format!("invalid cache key pattern '{pattern}': {reason}"))
}
