//! Submission through `JobOrchestrator::accept` all the way to a completed
//! job and a delivered `complete` webhook, wiring the orchestrator, a real
//! worker pipeline, and the webhook engine together the way
//! `mediaforge-api`'s `main.rs` does (spec §2 control flow, §8 scenario 2).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mediaforge_cache::{Cache, InMemoryRemoteStore};
use mediaforge_circuitbreaker::{CircuitBreaker, CircuitBreakerConfig};
use mediaforge_model::{ApiCredential, JobStatus, Tier};
use mediaforge_orchestrator::{
    CredentialRepository, InMemoryCredentialRepository, InMemoryJobRepository, JobOrchestrator, JobRepository, JobRequest,
    PipelineDispatcher,
};
use mediaforge_storage::LocalFsStorage;
use mediaforge_webhook::transport::fake::ScriptedTransport;
use mediaforge_webhook::{DeliveryStatus, WebhookEngine};
use mediaforge_worker::tool::fake::ScriptedTool;
use mediaforge_worker::tool::ProbeInfo;
use mediaforge_worker::{MediaTool, Pipeline};

fn t(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
}

fn credential(id: &str) -> ApiCredential {
    ApiCredential {
        id: id.to_string(),
        secret_hash: format!("hash-{id}"),
        tier: Tier::Basic,
        active: true,
        admin: false,
        max_concurrent_jobs: 5,
        revoked_at: None,
        expires_at: None,
        created_at: t(0),
    }
}

#[tokio::test]
async fn accepted_submission_runs_to_completion_and_fires_webhook() {
    let root = tempfile::tempdir().unwrap();
    tokio::fs::write(root.path().join("input.mp4"), b"fake video bytes").await.unwrap();

    let tool: Arc<dyn MediaTool> = Arc::new(ScriptedTool::new(
        ProbeInfo { duration_seconds: 2.0, has_video_stream: true, ..Default::default() },
        vec!["frame=10 fps=30 time=00:00:01.00 bitrate=900kbits/s speed=1.0x".to_string()],
        Ok(()),
    ));
    let storage = Arc::new(LocalFsStorage::new(root.path()));
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(mediaforge_webhook::transport::TransportResponse {
        status: 200,
        body: "ok".to_string(),
    })]));
    let webhook = WebhookEngine::in_memory(transport.clone());
    let pipeline = Arc::new(Pipeline::new(
        storage,
        tool,
        webhook.clone(),
        Arc::new(CircuitBreaker::new(CircuitBreakerConfig::new("media-tool"))),
        Arc::new(CircuitBreaker::new(CircuitBreakerConfig::new("storage"))),
        mediaforge_command::HardwareCapabilities::default(),
    ));

    let jobs: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
    let credentials: Arc<dyn CredentialRepository> = Arc::new(InMemoryCredentialRepository::new());
    credentials.save(&credential("cred1")).await.unwrap();

    let cache = Arc::new(Cache::new(Arc::new(InMemoryRemoteStore::new()), 1000));
    let dispatcher = Arc::new(PipelineDispatcher::new(pipeline, jobs.clone(), cache.clone(), "worker-1"));
    let orchestrator = JobOrchestrator::new(jobs.clone(), credentials, dispatcher, cache);

    let request = JobRequest {
        input_path: "input.mp4".to_string(),
        output_path: "output.mp4".to_string(),
        operations: serde_json::json!([{"transcode": {"video_codec": "h264", "crf": 23}}]),
        options: serde_json::json!({}),
        webhook_url: Some("https://example.com/hook".to_string()),
        priority: 0,
    };

    let accepted = orchestrator.accept(request, "cred1", t(0)).await.unwrap();
    assert_eq!(accepted.status, JobStatus::Queued);

    let job_id = accepted.id.clone();
    let mut final_job = None;
    for _ in 0..100 {
        if let Some(job) = orchestrator.get(&job_id).await.unwrap() {
            if job.status.is_terminal() {
                final_job = Some(job);
                break;
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    let final_job = final_job.expect("job did not reach a terminal state in time");
    assert_eq!(final_job.status, JobStatus::Completed);

    let deliveries = webhook.store().for_job(&job_id).await;
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].event, "complete");
    assert_eq!(deliveries[0].status, DeliveryStatus::Sent);
    assert_eq!(transport.calls.lock().unwrap().as_slice(), ["https://example.com/hook"]);
}

#[tokio::test]
async fn submission_over_the_concurrency_cap_is_rejected() {
    let jobs: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
    let credentials: Arc<dyn CredentialRepository> = Arc::new(InMemoryCredentialRepository::new());
    let mut cred = credential("cred1");
    cred.max_concurrent_jobs = 1;
    credentials.save(&cred).await.unwrap();

    // A non-terminal job already occupying the credential's one slot.
    let mut existing = mediaforge_model::Job::new("job-0", "a.mp4", "b.mp4", "cred1", t(0));
    existing.start("worker-1", t(0)).unwrap();
    jobs.save(&existing).await.unwrap();

    let root = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalFsStorage::new(root.path()));
    let tool: Arc<dyn MediaTool> = Arc::new(ScriptedTool::new(ProbeInfo::default(), vec![], Ok(())));
    let webhook = WebhookEngine::in_memory(Arc::new(ScriptedTransport::new(vec![])));
    let pipeline = Arc::new(Pipeline::new(
        storage,
        tool,
        webhook,
        Arc::new(CircuitBreaker::new(CircuitBreakerConfig::new("media-tool"))),
        Arc::new(CircuitBreaker::new(CircuitBreakerConfig::new("storage"))),
        mediaforge_command::HardwareCapabilities::default(),
    ));
    let cache = Arc::new(Cache::new(Arc::new(InMemoryRemoteStore::new()), 1000));
    let dispatcher = Arc::new(PipelineDispatcher::new(pipeline, jobs.clone(), cache.clone(), "worker-1"));
    let orchestrator = JobOrchestrator::new(jobs, credentials, dispatcher, cache);

    let request = JobRequest {
        input_path: "input.mp4".to_string(),
        output_path: "output.mp4".to_string(),
        operations: serde_json::json!([{"transcode": {}}]),
        options: serde_json::json!({}),
        webhook_url: None,
        priority: 0,
    };

    let result = orchestrator.accept(request, "cred1", t(1)).await;
    assert!(result.is_err(), "submission beyond the concurrency cap must be rejected");
}

#[tokio::test]
async fn path_traversal_in_locator_is_rejected_as_security_violation() {
    let jobs: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
    let credentials: Arc<dyn CredentialRepository> = Arc::new(InMemoryCredentialRepository::new());
    credentials.save(&credential("cred1")).await.unwrap();

    let root = tempfile::tempdir().unwrap();
    let storage = Arc::new(LocalFsStorage::new(root.path()));
    let tool: Arc<dyn MediaTool> = Arc::new(ScriptedTool::new(ProbeInfo::default(), vec![], Ok(())));
    let webhook = WebhookEngine::in_memory(Arc::new(ScriptedTransport::new(vec![])));
    let pipeline = Arc::new(Pipeline::new(
        storage,
        tool,
        webhook,
        Arc::new(CircuitBreaker::new(CircuitBreakerConfig::new("media-tool"))),
        Arc::new(CircuitBreaker::new(CircuitBreakerConfig::new("storage"))),
        mediaforge_command::HardwareCapabilities::default(),
    ));
    let cache = Arc::new(Cache::new(Arc::new(InMemoryRemoteStore::new()), 1000));
    let dispatcher = Arc::new(PipelineDispatcher::new(pipeline, jobs.clone(), cache.clone(), "worker-1"));
    let orchestrator = JobOrchestrator::new(jobs, credentials, dispatcher, cache);

    let request = JobRequest {
        input_path: "../../etc/passwd".to_string(),
        output_path: "output.mp4".to_string(),
        operations: serde_json::json!([{"transcode": {}}]),
        options: serde_json::json!({}),
        webhook_url: None,
        priority: 0,
    };

    let err = orchestrator.accept(request, "cred1", t(0)).await.unwrap_err();
    assert!(err.is_security(), "a '..' locator must be rejected as a security violation, got {err:?}");
}
