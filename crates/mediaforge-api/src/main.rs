//! Process entry point: loads configuration, wires every service together,
//! spawns the batch driver's background reconciliation loop, and serves the
//! HTTP surface. Grounded on the teacher's own `axum-resilient-kv-store`
//! binary for the `tracing_subscriber::fmt().init()` / `TcpListener::bind` /
//! `axum::serve` shape; the CLI override flags are this crate's own (the
//! teacher example takes none).

use std::sync::Arc;

use clap::Parser;
use mediaforge_api::config::Settings;
use mediaforge_api::{app, AppState};
use mediaforge_batch::{Driver, InMemoryBatchRepository, Scheduler};
use mediaforge_bulkhead::Registry as BulkheadRegistry;
use mediaforge_cache::{Cache, InMemoryRemoteStore};
use mediaforge_circuitbreaker::Registry as CircuitBreakerRegistry;
use mediaforge_command::HardwareCapabilities;
use mediaforge_executor::BlockingExecutor;
use mediaforge_lock::{DistributedLockManager, InMemoryLockStore};
use mediaforge_orchestrator::{
    CredentialRepository, InMemoryCredentialRepository, InMemoryJobRepository, JobOrchestrator, JobRepository,
    PipelineDispatcher,
};
use mediaforge_ratelimiter::RateLimiter;
use mediaforge_storage::LocalFsStorage;
use mediaforge_webhook::transport::ReqwestTransport;
use mediaforge_webhook::{InMemoryDeliveryStore, WebhookEngine, WebhookEngineConfig};
use mediaforge_worker::tool::ProcessMediaTool;
use mediaforge_worker::Pipeline;
use tokio::net::TcpListener;

/// Overrides layered on top of `MEDIAFORGE_*` environment settings
/// (spec §6); flags win when both are set.
#[derive(Parser, Debug)]
#[command(name = "mediaforge", about = "Media transcoding service")]
struct Cli {
    #[arg(long, env = "MEDIAFORGE_PORT")]
    port: Option<u16>,

    #[arg(long, env = "MEDIAFORGE_STORAGE_ROOT", default_value = "./storage")]
    storage_root: std::path::PathBuf,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

    let cli = Cli::parse();
    let mut settings = Settings::load().unwrap_or_else(|err| {
        tracing::warn!("failed to load settings from environment, using defaults: {err}");
        Settings::default()
    });
    if let Some(port) = cli.port {
        settings.port = port;
    }

    let cache = Arc::new(Cache::new(Arc::new(InMemoryRemoteStore::new()), settings.cache_max_fallback_size));
    let locks = Arc::new(DistributedLockManager::new(Arc::new(InMemoryLockStore::new())));
    let circuit_breakers = Arc::new(CircuitBreakerRegistry::new());
    let bulkheads = Arc::new(BulkheadRegistry::new());
    let rate_limiter = Arc::new(RateLimiter::new(Arc::new(InMemoryRemoteStore::new())));

    let storage = Arc::new(LocalFsStorage::new(cli.storage_root.clone()));
    let jobs: Arc<dyn JobRepository> = Arc::new(InMemoryJobRepository::new());
    let credentials: Arc<dyn CredentialRepository> = Arc::new(InMemoryCredentialRepository::new());
    let batches: Arc<dyn mediaforge_batch::BatchRepository> = Arc::new(InMemoryBatchRepository::new());

    let webhook_transport = Arc::new(ReqwestTransport::new("MediaForge/0.1.0"));
    let webhook_config = WebhookEngineConfig {
        user_agent: "MediaForge/0.1.0".to_string(),
        secret: settings.webhook_secret.clone(),
        timeout: settings.webhook_timeout(),
        production: settings.environment == "production",
    };
    let webhook = WebhookEngine::new(webhook_config, webhook_transport, Arc::new(InMemoryDeliveryStore::new()));

    let executor = BlockingExecutor::current();
    let tool = Arc::new(ProcessMediaTool::new(executor));
    let tool_breaker = circuit_breakers.get_or_default("media-tool").await;
    let storage_breaker = circuit_breakers.get_or_default("storage").await;
    let pipeline = Arc::new(Pipeline::new(
        storage.clone(),
        tool,
        webhook,
        tool_breaker,
        storage_breaker,
        HardwareCapabilities::default(),
    ));

    let dispatcher = Arc::new(PipelineDispatcher::new(pipeline, jobs.clone(), cache.clone(), "worker-1"));
    let orchestrator = Arc::new(JobOrchestrator::new(jobs.clone(), credentials.clone(), dispatcher.clone(), cache.clone()));
    let scheduler = Arc::new(Scheduler::new(batches.clone(), locks.clone(), bulkheads.clone()));

    let driver = Arc::new(Driver::new(batches.clone(), scheduler.clone(), dispatcher));
    tokio::spawn(driver.run(std::time::Duration::from_secs(2)));

    let state = AppState::new(
        settings.clone(),
        orchestrator,
        jobs,
        credentials,
        batches,
        scheduler,
        cache,
        storage,
        rate_limiter,
        circuit_breakers,
    );

    let bind_addr = format!("{}:{}", settings.host, settings.port);
    let listener = TcpListener::bind(&bind_addr).await.expect("failed to bind listen address");
    tracing::info!("mediaforge listening on http://{bind_addr}");

    axum::serve(listener, app(state).into_make_service())
        .await
        .expect("server error");
}
