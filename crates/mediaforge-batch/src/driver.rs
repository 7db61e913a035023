//! Background reconciliation loop that drives every active batch's
//! scheduler tick (spec §4.J). Nothing in this crate subscribes to
//! pipeline-completion events, so the driver polls: each pass records any
//! child that went terminal since the last pass against its batch's
//! counters, then ticks to promote into whatever slots that freed up.

use crate::repository::BatchRepository;
use crate::scheduler::Scheduler;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediaforge_bulkhead::BulkheadPermit;
use mediaforge_core::Error;
use mediaforge_model::{Job, JobStatus};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Hands a scheduler-promoted child off for processing. Implemented by
/// `mediaforge_orchestrator::PipelineDispatcher` in production, which keeps
/// `permit` alive for as long as the child's pipeline is running.
#[async_trait]
pub trait BatchJobDispatcher: Send + Sync {
    async fn dispatch(&self, job: Job, permit: BulkheadPermit) -> Result<(), Error>;
}

/// Polls every active batch, recording terminal children and promoting new
/// ones, on a fixed interval.
pub struct Driver {
    repository: Arc<dyn BatchRepository>,
    scheduler: Arc<Scheduler>,
    dispatcher: Arc<dyn BatchJobDispatcher>,
    recorded: Mutex<HashSet<String>>,
}

impl Driver {
    pub fn new(repository: Arc<dyn BatchRepository>, scheduler: Arc<Scheduler>, dispatcher: Arc<dyn BatchJobDispatcher>) -> Self {
        Self { repository, scheduler, dispatcher, recorded: Mutex::new(HashSet::new()) }
    }

    /// One reconciliation pass over every active batch.
    pub async fn tick_all(&self, now: DateTime<Utc>) -> Result<(), Error> {
        for batch_id in self.repository.list_active().await? {
            self.reconcile(&batch_id).await?;
            let dispatches = self.scheduler.tick(&batch_id, now).await?;
            for dispatch in dispatches {
                self.dispatcher.dispatch(dispatch.job, dispatch.permit).await?;
            }
        }
        Ok(())
    }

    /// Records every child that reached a terminal, non-cancelled state
    /// since the last pass. `recorded` is keyed by job id so a child is
    /// never double-counted against the batch's `completed`/`failed`
    /// totals across passes (cancellation is handled directly by
    /// [`Scheduler::cancel`], not here).
    async fn reconcile(&self, batch_id: &str) -> Result<(), Error> {
        let children = self.repository.children(batch_id).await?;
        let newly_terminal: Vec<Job> = {
            let mut recorded = self.recorded.lock().unwrap();
            children
                .into_iter()
                .filter(|job| matches!(job.status, JobStatus::Completed | JobStatus::Failed) && recorded.insert(job.id.clone()))
                .collect()
        };
        for job in newly_terminal {
            self.scheduler.record_outcome(batch_id, &job).await?;
        }
        Ok(())
    }

    /// Runs [`Self::tick_all`] on a fixed interval until cancelled. Meant to
    /// be spawned once at process start (`tokio::spawn(driver.run(...))`).
    pub async fn run(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if let Err(_err) = self.tick_all(Utc::now()).await {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %_err, "batch driver reconciliation pass failed");
            }
        }
    }
}
