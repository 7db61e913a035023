//! Shared job/batch/credential data model (spec §3 "Data Model"), used by
//! the worker pipeline, batch coordinator, job orchestrator, and HTTP
//! surface so none of them need to depend on one another just to share
//! these types.

pub mod batch;
pub mod credential;
pub mod job;

pub use batch::{Batch, BatchStatus};
pub use credential::{ApiCredential, Tier, DEFAULT_MAX_CONCURRENT_JOBS};
pub use job::{Job, JobInvariantError, JobStatus};
