//! Storage seam for batch and child-job state. The orchestrator's database
//! backs this in production; [`InMemoryBatchRepository`] exists for tests
//! and single-node deployments.

use async_trait::async_trait;
use mediaforge_core::Error;
use mediaforge_model::{Batch, Job, JobStatus};
use std::collections::HashMap;
use std::sync::Mutex;

#[async_trait]
pub trait BatchRepository: Send + Sync {
    async fn create(&self, batch: Batch, children: Vec<Job>) -> Result<(), Error>;
    async fn load_batch(&self, batch_id: &str) -> Result<Option<Batch>, Error>;
    async fn save_batch(&self, batch: &Batch) -> Result<(), Error>;
    async fn children(&self, batch_id: &str) -> Result<Vec<Job>, Error>;
    async fn save_job(&self, job: &Job) -> Result<(), Error>;
    /// Ids of every batch not yet cancelled or terminal, for the driver's
    /// poll loop (spec §4.J: the scheduler tick applies to any batch with
    /// outstanding work, not just one named by an inbound request).
    async fn list_active(&self) -> Result<Vec<String>, Error>;
}

#[derive(Default)]
pub struct InMemoryBatchRepository {
    batches: Mutex<HashMap<String, Batch>>,
    jobs: Mutex<HashMap<String, Vec<Job>>>,
}

impl InMemoryBatchRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BatchRepository for InMemoryBatchRepository {
    /// Inserts the batch and every child atomically from callers' point of
    /// view: both maps are populated before the lock guards are dropped, so
    /// no reader ever observes a batch without its children (spec §4.J
    /// "create batch and all child jobs in a single transactional unit").
    async fn create(&self, batch: Batch, children: Vec<Job>) -> Result<(), Error> {
        let mut batches = self.batches.lock().unwrap();
        let mut jobs = self.jobs.lock().unwrap();
        jobs.insert(batch.id.clone(), children);
        batches.insert(batch.id.clone(), batch);
        Ok(())
    }

    async fn load_batch(&self, batch_id: &str) -> Result<Option<Batch>, Error> {
        Ok(self.batches.lock().unwrap().get(batch_id).cloned())
    }

    async fn save_batch(&self, batch: &Batch) -> Result<(), Error> {
        self.batches.lock().unwrap().insert(batch.id.clone(), batch.clone());
        Ok(())
    }

    async fn children(&self, batch_id: &str) -> Result<Vec<Job>, Error> {
        Ok(self.jobs.lock().unwrap().get(batch_id).cloned().unwrap_or_default())
    }

    async fn save_job(&self, job: &Job) -> Result<(), Error> {
        let batch_id = job.batch_id.clone().ok_or_else(|| Error::internal("job has no batch_id"))?;
        let mut jobs = self.jobs.lock().unwrap();
        let children = jobs.entry(batch_id).or_default();
        if let Some(existing) = children.iter_mut().find(|j| j.id == job.id) {
            *existing = job.clone();
        } else {
            children.push(job.clone());
        }
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .batches
            .lock()
            .unwrap()
            .values()
            .filter(|b| !b.cancelled && !b.is_terminal())
            .map(|b| b.id.clone())
            .collect())
    }
}

pub fn queued(children: &[Job]) -> impl Iterator<Item = &Job> {
    children.iter().filter(|j| j.status == JobStatus::Queued)
}

pub fn non_terminal(children: &[Job]) -> impl Iterator<Item = &Job> {
    children.iter().filter(|j| !j.status.is_terminal())
}
