//! Batch-of-jobs coordination (spec §4.J): transactional batch+children
//! creation, a lock-serialized concurrency-capped scheduler tick, retry
//! budget tracking, and cancellation.

pub mod driver;
pub mod repository;
pub mod retry;
pub mod scheduler;

pub use driver::{BatchJobDispatcher, Driver};
pub use repository::{BatchRepository, InMemoryBatchRepository};
pub use retry::{retry_or_leave_failed, should_retry, DEFAULT_MAX_RETRIES};
pub use scheduler::{Dispatch, Scheduler};
