//! Cross-crate integration tests.
//!
//! Unlike the per-crate `#[cfg(test)]` modules, these wire several crates
//! together the way `mediaforge-api`'s `main.rs` does, so a regression that
//! only shows up at the seam between two crates has somewhere to surface.

#[path = "integration/mod.rs"]
mod integration;
