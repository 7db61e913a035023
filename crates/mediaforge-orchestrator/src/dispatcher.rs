//! Hands an accepted job off to a worker pipeline and tracks the cancel
//! token needed to signal it mid-flight (spec §4.K "Cancel: ... signals the
//! worker to stop"). The teacher's "ambient global singleton → explicit
//! context object" redesign flag applies here too: rather than a module-level
//! queue, the orchestrator holds an explicit `Arc<dyn Dispatcher>` it was
//! constructed with.

use async_trait::async_trait;
use mediaforge_bulkhead::BulkheadPermit;
use mediaforge_cache::{Cache, Category, KeyBuilder};
use mediaforge_core::Error;
use mediaforge_model::Job;
use mediaforge_worker::{CancelToken, JobRecorder, Pipeline};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::repository::JobRepository;

/// Persists a job snapshot through the orchestrator's repository and
/// invalidates both the per-job cache entry and the submitting credential's
/// job-list cache (spec §4.G "invalidate all cache entries whose keys
/// include the job id").
pub struct RepositoryJobRecorder {
    repository: Arc<dyn JobRepository>,
    cache: Arc<Cache>,
}

impl RepositoryJobRecorder {
    pub fn new(repository: Arc<dyn JobRepository>, cache: Arc<Cache>) -> Self {
        Self { repository, cache }
    }
}

#[async_trait]
impl JobRecorder for RepositoryJobRecorder {
    async fn persist(&self, job: &Job) {
        let _ = self.repository.save(job).await;
        self.cache.set(&KeyBuilder::job_key(&job.id), job, Category::JobStatus).await;
    }

    async fn invalidate(&self, job_id: &str) {
        self.cache.delete(&KeyBuilder::job_key(job_id)).await;
        if let Ok(Some(job)) = self.repository.get(job_id).await {
            let _ = self.cache.delete_pattern(&format!("mediaforge:job_list:{}:*", job.credential_id)).await;
        }
    }
}

/// Hands a queued job off for processing and can signal an in-flight job to
/// stop.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, job: Job) -> Result<(), Error>;
    fn signal_cancel(&self, job_id: &str);
}

/// Runs jobs in-process against a [`Pipeline`], spawned on the current Tokio
/// runtime: the single-node analogue of the original's Celery `.delay()`
/// enqueue (spec §9: "pick one concurrency model end-to-end").
pub struct PipelineDispatcher {
    pipeline: Arc<Pipeline>,
    repository: Arc<dyn JobRepository>,
    cache: Arc<Cache>,
    worker_id: String,
    tokens: Arc<Mutex<HashMap<String, CancelToken>>>,
}

impl PipelineDispatcher {
    pub fn new(
        pipeline: Arc<Pipeline>,
        repository: Arc<dyn JobRepository>,
        cache: Arc<Cache>,
        worker_id: impl Into<String>,
    ) -> Self {
        Self {
            pipeline,
            repository,
            cache,
            worker_id: worker_id.into(),
            tokens: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl Dispatcher for PipelineDispatcher {
    async fn dispatch(&self, job: Job) -> Result<(), Error> {
        let cancel = CancelToken::new();
        self.tokens.lock().unwrap().insert(job.id.clone(), cancel.clone());

        let pipeline = self.pipeline.clone();
        let recorder: Arc<dyn JobRecorder> = Arc::new(RepositoryJobRecorder::new(self.repository.clone(), self.cache.clone()));
        let worker_id = self.worker_id.clone();
        let job_id = job.id.clone();
        let tokens = self.tokens.clone();

        tokio::spawn(async move {
            pipeline.run(job, &worker_id, recorder, cancel, chrono::Utc::now).await;
            tokens.lock().unwrap().remove(&job_id);
        });
        Ok(())
    }

    fn signal_cancel(&self, job_id: &str) {
        if let Some(token) = self.tokens.lock().unwrap().get(job_id) {
            token.cancel();
        }
    }
}

impl PipelineDispatcher {
    /// Like [`Dispatcher::dispatch`], but keeps `permit` alive for the
    /// whole spawned pipeline run instead of dropping it as soon as the
    /// task is handed off. Used by the batch driver (spec §4.J), whose
    /// bulkhead permit must still be held when the child is in flight, not
    /// just at the moment of promotion.
    pub async fn dispatch_with_permit(&self, job: Job, permit: BulkheadPermit) -> Result<(), Error> {
        let cancel = CancelToken::new();
        self.tokens.lock().unwrap().insert(job.id.clone(), cancel.clone());

        let pipeline = self.pipeline.clone();
        let recorder: Arc<dyn JobRecorder> = Arc::new(RepositoryJobRecorder::new(self.repository.clone(), self.cache.clone()));
        let worker_id = self.worker_id.clone();
        let job_id = job.id.clone();
        let tokens = self.tokens.clone();

        tokio::spawn(async move {
            let _permit = permit;
            pipeline.run(job, &worker_id, recorder, cancel, chrono::Utc::now).await;
            tokens.lock().unwrap().remove(&job_id);
        });
        Ok(())
    }
}

#[async_trait]
impl mediaforge_batch::BatchJobDispatcher for PipelineDispatcher {
    async fn dispatch(&self, job: Job, permit: BulkheadPermit) -> Result<(), Error> {
        self.dispatch_with_permit(job, permit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryJobRepository;
    use mediaforge_cache::InMemoryRemoteStore;
    use mediaforge_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
    use mediaforge_storage::LocalFsStorage;
    use mediaforge_webhook::transport::fake::ScriptedTransport;
    use mediaforge_webhook::WebhookEngine;
    use mediaforge_worker::tool::fake::ScriptedTool;
    use mediaforge_worker::tool::ProbeInfo;
    use mediaforge_worker::MediaTool;

    fn t(seconds: i64) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    #[tokio::test]
    async fn recorder_persists_and_invalidates_job_list_cache() {
        let repo: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
        let cache = Arc::new(Cache::new(Arc::new(InMemoryRemoteStore::new()), 1000));
        let recorder = RepositoryJobRecorder::new(repo.clone(), cache.clone());

        let job = Job::new("job-1", "in.mp4", "out.mp4", "cred1", t(0));
        recorder.persist(&job).await;
        assert!(repo.get("job-1").await.unwrap().is_some());

        cache
            .set(&KeyBuilder::build(&["job_list", "cred1", "abc"]), &serde_json::json!([]), Category::JobList)
            .await;
        recorder.invalidate("job-1").await;
        let cached: Option<serde_json::Value> = cache.get(&KeyBuilder::build(&["job_list", "cred1", "abc"])).await;
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn dispatch_runs_the_job_to_completion() {
        let root = tempfile::tempdir().unwrap();
        tokio::fs::write(root.path().join("input.mp4"), b"fake").await.unwrap();

        let tool: Arc<dyn MediaTool> = Arc::new(ScriptedTool::new(
            ProbeInfo { duration_seconds: 1.0, has_video_stream: true, ..Default::default() },
            vec![],
            Ok(()),
        ));
        let storage = Arc::new(LocalFsStorage::new(root.path()));
        let webhook = WebhookEngine::in_memory(Arc::new(ScriptedTransport::new(vec![])));
        let pipeline = Arc::new(Pipeline::new(
            storage,
            tool,
            webhook,
            Arc::new(CircuitBreaker::new(CircuitBreakerConfig::new("media-tool"))),
            Arc::new(CircuitBreaker::new(CircuitBreakerConfig::new("storage"))),
            mediaforge_command::HardwareCapabilities::default(),
        ));

        let repo: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
        let cache = Arc::new(Cache::new(Arc::new(InMemoryRemoteStore::new()), 1000));
        let dispatcher = PipelineDispatcher::new(pipeline, repo.clone(), cache, "worker-1");

        let mut job = Job::new("job-1", "input.mp4", "output.mp4", "cred1", t(0));
        job.operations = serde_json::json!([{"transcode": {}}]);
        dispatcher.dispatch(job).await.unwrap();

        for _ in 0..50 {
            if let Some(stored) = repo.get("job-1").await.unwrap() {
                if stored.status.is_terminal() {
                    assert_eq!(stored.status, mediaforge_model::JobStatus::Completed);
                    return;
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        panic!("job did not reach a terminal state in time");
    }
}
