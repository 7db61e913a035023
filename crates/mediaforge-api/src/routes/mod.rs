//! Route handlers, one module per resource (spec §4.K/§4.J/§4.L). Kept thin:
//! validation and persistence live in `mediaforge-orchestrator` and
//! `mediaforge-batch`; a handler's job is extracting/authenticating the
//! request and shaping the response.

pub mod admin;
pub mod batches;
pub mod health;
pub mod jobs;
