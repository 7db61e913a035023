//! Job orchestration (spec §4.K): submission, lookup, paginated listing,
//! cancellation, and the admin storage-status/cleanup probes. Sits directly
//! on top of `mediaforge-worker`'s pipeline and `mediaforge-cache`'s
//! two-tier cache; the database and the HTTP transport itself stay out of
//! scope (spec §1); this crate is the dependency the HTTP surface calls
//! into.

pub mod admin;
pub mod dispatcher;
pub mod locator;
pub mod orchestrator;
pub mod repository;

pub use admin::{cleanup_old_jobs, storage_backend_status, CleanupFailure, CleanupReport};
pub use dispatcher::{Dispatcher, PipelineDispatcher, RepositoryJobRecorder};
pub use locator::parse_locator;
pub use orchestrator::{JobOrchestrator, JobRequest};
pub use repository::{CredentialRepository, InMemoryCredentialRepository, InMemoryJobRepository, JobPage, JobRepository};
