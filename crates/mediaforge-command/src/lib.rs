//! Validated argv construction for the external transcoding tool
//! (spec §4.F "Command Builder").
//!
//! This crate never spawns a process and never touches the filesystem
//! beyond the paths it's handed; it turns a typed [`operations::Operation`]
//! list plus [`operations::OutputOptions`] into a vetted argument vector, or
//! rejects it. The actual invocation (and the blocking wait on the child
//! process) lives in `mediaforge-worker`, dispatched through
//! `mediaforge-executor`.

pub mod builder;
pub mod hardware;
pub mod operations;
pub mod validate;

pub use builder::CommandBuilder;
pub use hardware::{Encoder, HardwareCapabilities, HardwareProbe, StaticProbe};
pub use operations::{Operation, OutputOptions};
pub use validate::CompatibilityWarning;

#[cfg(feature = "probe")]
pub use hardware::FfmpegProbe;
