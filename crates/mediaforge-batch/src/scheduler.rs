//! Batch scheduling: transactional creation and the lock-serialized,
//! bulkhead-capped promotion tick (spec §4.J).

use crate::repository::{non_terminal, queued, BatchRepository};
use chrono::{DateTime, Utc};
use mediaforge_bulkhead::{BulkheadConfig, BulkheadPermit};
use mediaforge_core::Error;
use mediaforge_lock::DistributedLockManager;
use mediaforge_model::{Batch, Job};
use std::sync::Arc;
use std::time::Duration;

const LOCK_TTL: Duration = Duration::from_secs(30);

/// A child promoted to processing by a scheduler tick, paired with the
/// bulkhead permit that must stay held for as long as the job is in
/// flight (spec §9: "the lock guards the admission decision, the bulkhead
/// guards how many dispatches are in flight").
pub struct Dispatch {
    pub job: Job,
    pub permit: BulkheadPermit,
}

pub struct Scheduler {
    repository: Arc<dyn BatchRepository>,
    locks: Arc<DistributedLockManager>,
    bulkheads: Arc<mediaforge_bulkhead::Registry>,
}

impl Scheduler {
    pub fn new(
        repository: Arc<dyn BatchRepository>,
        locks: Arc<DistributedLockManager>,
        bulkheads: Arc<mediaforge_bulkhead::Registry>,
    ) -> Self {
        Self { repository, locks, bulkheads }
    }

    /// Creates a batch and all of its children in one transactional unit
    /// (spec §4.J "Enqueue").
    pub async fn enqueue(&self, batch: Batch, children: Vec<Job>) -> Result<Batch, Error> {
        self.repository.create(batch.clone(), children).await?;
        Ok(batch)
    }

    /// Promotes as many queued children as the batch's concurrency cap
    /// allows, serialized by a distributed lock keyed on the batch id so
    /// two concurrent tick callers never both promote into the same slot.
    pub async fn tick(&self, batch_id: &str, now: DateTime<Utc>) -> Result<Vec<Dispatch>, Error> {
        let lock = self
            .locks
            .acquire(&format!("batch_scheduler:{batch_id}"), LOCK_TTL, true, Some(LOCK_TTL))
            .await?;

        let result = self.tick_locked(batch_id, now).await;

        let _ = lock.release().await;
        result
    }

    async fn tick_locked(&self, batch_id: &str, now: DateTime<Utc>) -> Result<Vec<Dispatch>, Error> {
        let mut batch = self
            .repository
            .load_batch(batch_id)
            .await?
            .ok_or_else(|| Error::validation(format!("unknown batch: {batch_id}")))?;

        if batch.cancelled || batch.is_terminal() {
            return Ok(Vec::new());
        }

        let children = self.repository.children(batch_id).await?;
        let candidates: Vec<Job> = queued(&children).cloned().collect();

        let bulkhead = self
            .bulkheads
            .get_or_insert_with(batch_id, || BulkheadConfig::new(batch_id, batch.max_concurrent as usize))
            .await;

        let mut dispatches = Vec::new();
        for mut job in candidates {
            if batch.available_slots() == 0 {
                break;
            }
            let permit = match bulkhead.acquire().await {
                Ok(permit) => permit,
                Err(_) => break,
            };

            job.priority = job.priority.max(batch.priority);
            batch.mark_started(now);
            batch.record_promotion();
            self.repository.save_job(&job).await?;
            dispatches.push(Dispatch { job, permit });
        }

        self.repository.save_batch(&batch).await?;
        Ok(dispatches)
    }

    /// Records a child's terminal outcome against the batch counters and
    /// persists both (spec §4.J "On child terminal transition: increment
    /// the matching counter").
    pub async fn record_outcome(&self, batch_id: &str, job: &Job) -> Result<Batch, Error> {
        let mut batch = self
            .repository
            .load_batch(batch_id)
            .await?
            .ok_or_else(|| Error::validation(format!("unknown batch: {batch_id}")))?;

        if job.status == mediaforge_model::JobStatus::Completed {
            batch.record_completion();
        } else {
            batch.record_failure();
        }

        self.repository.save_job(job).await?;
        self.repository.save_batch(&batch).await?;
        Ok(batch)
    }

    /// Marks all non-terminal children cancelled and the batch itself as
    /// refusing further dispatch (spec §4.J "Cancellation").
    pub async fn cancel(&self, batch_id: &str, now: DateTime<Utc>) -> Result<Batch, Error> {
        let mut batch = self
            .repository
            .load_batch(batch_id)
            .await?
            .ok_or_else(|| Error::validation(format!("unknown batch: {batch_id}")))?;

        let children = self.repository.children(batch_id).await?;
        for mut job in non_terminal(&children).cloned().collect::<Vec<_>>() {
            let _ = job.cancel(now);
            self.repository.save_job(&job).await?;
        }

        batch.cancelled = true;
        self.repository.save_batch(&batch).await?;
        self.bulkheads.remove(batch_id).await;
        Ok(batch)
    }
}
