//! The six-stage per-job pipeline (spec §4.H): Start, Download, Analyze,
//! Process, Upload, Finalize. Grounded on `tasks.process_video_job` and the
//! processor modules it dispatches to, collapsed here into one ordered
//! sequence since this CORE doesn't distinguish transcode/stream/filter
//! processors at the task level, only at the command-builder level
//! (`mediaforge_command::Operation`).

use crate::operations::{parse_operations, parse_options};
use crate::timeout::processing_timeout;
use crate::tool::MediaTool;
use crate::workspace::Workspace;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mediaforge_circuitbreaker::CircuitBreaker;
use mediaforge_command::CommandBuilder;
use mediaforge_model::{Job, JobStatus};
use mediaforge_progress::{parse_progress, ProgressSink, ProgressTracker, ProgressUpdate};
use mediaforge_storage::{Location, Storage};
use mediaforge_webhook::WebhookEngine;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::unbounded_channel;

/// Persists a job's state and invalidates any cached snapshot. The
/// orchestrator's repository (backed by `mediaforge-cache` for the
/// snapshot) implements this; this crate stays free of a dependency on
/// either.
#[async_trait]
pub trait JobRecorder: Send + Sync {
    async fn persist(&self, job: &Job);
    async fn invalidate(&self, job_id: &str);
}

/// Bridges `mediaforge_progress::ProgressSink` onto a shared `Job`: every
/// forced progress update is folded into the job's fields and handed to the
/// recorder.
struct JobProgressBridge {
    job: Arc<Mutex<Job>>,
    recorder: Arc<dyn JobRecorder>,
}

#[async_trait]
impl ProgressSink for JobProgressBridge {
    async fn record(&self, update: ProgressUpdate) {
        {
            let mut job = self.job.lock().unwrap();
            let _ = job.apply_progress(update.percentage, &update.stage, &update.message, update.at);
            job.processing_stats = update.stats;
        }
        let snapshot = self.job.lock().unwrap().clone();
        self.recorder.persist(&snapshot).await;
        self.recorder.invalidate(&snapshot.id).await;
    }

    async fn record_failure(&self, job_id: &str, _error_message: &str, _at: DateTime<Utc>) {
        self.recorder.invalidate(job_id).await;
    }
}

/// Cooperative cancellation handle: checked between stages and raced
/// against the media-tool invocation. Killing an already-spawned child
/// process is the media tool implementation's responsibility; this only
/// stops the pipeline from starting further work once signalled.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Pipeline {
    storage: Arc<dyn Storage>,
    tool: Arc<dyn MediaTool>,
    webhook: Arc<WebhookEngine>,
    tool_breaker: Arc<CircuitBreaker>,
    storage_breaker: Arc<CircuitBreaker>,
    capabilities: mediaforge_command::HardwareCapabilities,
}

impl Pipeline {
    pub fn new(
        storage: Arc<dyn Storage>,
        tool: Arc<dyn MediaTool>,
        webhook: Arc<WebhookEngine>,
        tool_breaker: Arc<CircuitBreaker>,
        storage_breaker: Arc<CircuitBreaker>,
        capabilities: mediaforge_command::HardwareCapabilities,
    ) -> Self {
        Self { storage, tool, webhook, tool_breaker, storage_breaker, capabilities }
    }

    /// Drives `job` through all six stages, mutating it in place and
    /// persisting/notifying through `recorder` as it goes. Returns the
    /// final job snapshot; errors are folded into a failed/cancelled job
    /// rather than propagated, since a pipeline failure is itself a
    /// terminal outcome the caller records, not a call-site error.
    pub async fn run(
        &self,
        job: Job,
        worker_id: &str,
        recorder: Arc<dyn JobRecorder>,
        cancel: CancelToken,
        now: impl Fn() -> DateTime<Utc> + Send + Sync,
    ) -> Job {
        let job = Arc::new(Mutex::new(job));
        let sink = JobProgressBridge { job: job.clone(), recorder: recorder.clone() };
        let job_id = job.lock().unwrap().id.clone();
        let mut tracker = ProgressTracker::new(job_id.clone(), sink, now());

        match self.run_inner(&job, worker_id, &mut tracker, &cancel, &now).await {
            Ok(()) => {
                let mut guard = job.lock().unwrap();
                let _ = guard.complete(now());
            }
            Err(outcome) => {
                let mut guard = job.lock().unwrap();
                match outcome {
                    Outcome::Cancelled => {
                        let _ = guard.cancel(now());
                    }
                    Outcome::Failed(message) => {
                        let _ = guard.fail(message, now());
                    }
                }
            }
        }

        let finished = job.lock().unwrap().clone();
        recorder.persist(&finished).await;
        recorder.invalidate(&finished.id).await;
        self.notify(&finished).await;
        finished
    }

    async fn run_inner(
        &self,
        job: &Arc<Mutex<Job>>,
        worker_id: &str,
        tracker: &mut ProgressTracker<JobProgressBridge>,
        cancel: &CancelToken,
        now: &(impl Fn() -> DateTime<Utc> + Send + Sync),
    ) -> Result<(), Outcome> {
        // Stage 1: Start (0%).
        {
            let mut guard = job.lock().unwrap();
            guard.start(worker_id, now()).map_err(|e| Outcome::Failed(e.to_string()))?;
        }
        tracker.set_stage("start", "Job accepted by worker", now()).await;
        self.check_cancelled(cancel)?;

        let workspace = Workspace::new().map_err(|e| Outcome::Failed(e.to_string()))?;

        // Stage 2: Download (0 -> 10%).
        let (input_location, output_location, options_json, operations_json) = {
            let guard = job.lock().unwrap();
            (
                Location::remote(guard.input_path.clone()),
                Location::remote(guard.output_path.clone()),
                guard.options.clone(),
                guard.operations.clone(),
            )
        };
        let local_input = self
            .storage_breaker
            .call(|| self.storage.get(&input_location))
            .await
            .map_err(|e| Outcome::Failed(breaker_message("storage", e)))?;
        tracker.update(10.0, "download", "Input downloaded", None, now()).await;
        self.check_cancelled(cancel)?;

        // Stage 3: Analyze (10 -> 20%).
        let probe = self
            .tool_breaker
            .call(|| self.tool.probe(&local_input))
            .await
            .map_err(|e| Outcome::Failed(breaker_message("media tool", e)))?;
        if !probe.has_video_stream {
            return Err(Outcome::Failed("input has no video stream".to_string()));
        }
        let operations = parse_operations(&operations_json).map_err(|e| Outcome::Failed(e.to_string()))?;
        let output_options = parse_options(&options_json).map_err(|e| Outcome::Failed(e.to_string()))?;
        let timeout = processing_timeout(probe.duration_seconds, &operations);
        tracker.update(20.0, "analyze", "Input probed", None, now()).await;
        self.check_cancelled(cancel)?;

        // Stage 4: Process (20 -> 90%).
        let output_path = workspace.join("output");
        let builder = CommandBuilder::new(&self.capabilities);
        let (built, _warnings) = builder
            .build(&local_input.to_string_lossy(), &output_path.to_string_lossy(), &output_options, &operations)
            .map_err(|e| Outcome::Failed(e.to_string()))?;

        let (tx, mut rx) = unbounded_channel::<String>();
        let tool = self.tool.clone();
        let argv = built.argv.clone();
        let execution = tokio::spawn(async move { tool.execute(&argv, tx).await });

        let total_duration = probe.duration_seconds;
        // A single deadline for the whole processing stage, not a
        // per-line idle timeout: the sleep future is created once, before
        // the loop, so a chatty but slow-overall media tool still gets cut
        // off at `timeout` instead of resetting the clock on every
        // progress line.
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                line = rx.recv() => {
                    match line {
                        Some(line) => {
                            if let Some(sample) = parse_progress(&line, Some(total_duration)) {
                                let scaled = (20.0 + sample.percentage.unwrap_or(0.0) * 0.7).min(90.0);
                                tracker.update(scaled, "processing", "Transcoding", Some(sample), now()).await;
                            }
                        }
                        None => break,
                    }
                }
                _ = &mut deadline => {
                    execution.abort();
                    return Err(Outcome::Failed("media tool exceeded its processing timeout".to_string()));
                }
            }
            if cancel.is_cancelled() {
                execution.abort();
                return Err(Outcome::Cancelled);
            }
        }

        execution
            .await
            .map_err(|e| Outcome::Failed(format!("media tool task failed: {e}")))?
            .map_err(|e| Outcome::Failed(e.to_string()))?;
        tracker.update(90.0, "process", "Transcoding finished", None, now()).await;
        self.check_cancelled(cancel)?;

        // Stage 5: Upload (90 -> 100%).
        self.storage_breaker
            .call(|| self.storage.put(&output_path, &output_location))
            .await
            .map_err(|e| Outcome::Failed(breaker_message("storage", e)))?;
        tracker.update(100.0, "upload", "Output uploaded", None, now()).await;

        // Stage 6 (partial): capture bitrate/compression metrics while the
        // local output file still exists, "if computed" per the finalize
        // contract; VMAF/PSNR require a dedicated reference-comparison run
        // and are out of scope for the default pipeline. Best-effort: a
        // probe failure here never fails the job.
        if let Ok(output_probe) = self.tool.probe(&output_path).await {
            let bitrate = mediaforge_quality::bitrate::calculate_bitrate_comparison(
                probe.bit_rate,
                output_probe.bit_rate,
                probe.size_bytes,
                output_probe.size_bytes,
            );
            let report = mediaforge_quality::report::generate_quality_report(None, None, Some(&bitrate));
            job.lock().unwrap().quality_scores = Some(serde_json::json!({"bitrate": bitrate, "report": report}));
        } else {
            #[cfg(feature = "tracing")]
            tracing::warn!("failed to probe output file for quality metrics");
        }

        // The rest of Stage 6 (Finalize) happens in `run`, which transitions
        // the job and fires the completion webhook once the workspace (and
        // its temp files) have been dropped.
        drop(workspace);
        Ok(())
    }

    fn check_cancelled(&self, cancel: &CancelToken) -> Result<(), Outcome> {
        if cancel.is_cancelled() {
            Err(Outcome::Cancelled)
        } else {
            Ok(())
        }
    }

    async fn notify(&self, job: &Job) {
        let Some(url) = job.webhook_url.as_deref() else { return };
        match job.status {
            JobStatus::Completed => {
                self.webhook
                    .send(&job.id, "complete", url, serde_json::json!({"output_path": job.output_path}), true)
                    .await;
            }
            JobStatus::Failed => {
                self.webhook
                    .send(
                        &job.id,
                        "error",
                        url,
                        serde_json::json!({"reason": job.error_message.clone().unwrap_or_default()}),
                        true,
                    )
                    .await;
            }
            JobStatus::Cancelled => {
                self.webhook
                    .send(&job.id, "error", url, serde_json::json!({"reason": "cancelled"}), false)
                    .await;
            }
            JobStatus::Queued | JobStatus::Processing => {}
        }
    }
}

enum Outcome {
    Cancelled,
    Failed(String),
}

fn breaker_message<E: std::fmt::Display>(dependency: &str, error: mediaforge_circuitbreaker::CircuitBreakerError<E>) -> String {
    match error {
        mediaforge_circuitbreaker::CircuitBreakerError::Open { name } => {
            format!("{dependency} circuit '{name}' is open")
        }
        mediaforge_circuitbreaker::CircuitBreakerError::Inner(inner) => inner.to_string(),
    }
}
