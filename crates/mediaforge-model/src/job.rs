//! The job entity (spec §3 "Job").

use chrono::{DateTime, Utc};
use mediaforge_progress::ProcessingStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub input_path: String,
    pub output_path: String,
    pub options: serde_json::Value,
    pub operations: serde_json::Value,
    pub batch_id: Option<String>,
    pub webhook_url: Option<String>,
    pub priority: i32,
    pub progress: f64,
    pub stage: String,
    pub status_message: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub worker_id: Option<String>,
    pub error_message: Option<String>,
    pub quality_scores: Option<serde_json::Value>,
    pub processing_stats: Option<ProcessingStats>,
    pub credential_id: String,
    pub retry_count: u32,
}

/// Raised when a caller attempts a mutation the job's current state or
/// invariants disallow (e.g. writing a lower progress than already
/// recorded, or mutating a terminal job).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JobInvariantError {
    #[error("job {0} is terminal and cannot be mutated")]
    Terminal(String),
    #[error("progress must be non-decreasing within a processing epoch: {old} -> {new}")]
    ProgressRegression { old: u32, new: u32 },
    #[error("progress must be within [0, 100], got {0}")]
    ProgressOutOfRange(f64),
}

impl Job {
    pub fn new(
        id: impl Into<String>,
        input_path: impl Into<String>,
        output_path: impl Into<String>,
        credential_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            input_path: input_path.into(),
            output_path: output_path.into(),
            options: serde_json::json!({}),
            operations: serde_json::json!([]),
            batch_id: None,
            webhook_url: None,
            priority: 0,
            progress: 0.0,
            stage: "queued".to_string(),
            status_message: String::new(),
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
            worker_id: None,
            error_message: None,
            quality_scores: None,
            processing_stats: None,
            credential_id: credential_id.into(),
            retry_count: 0,
        }
    }

    /// Transitions queued -> processing, claiming the job for `worker_id`
    /// (spec §3 invariant: `worker_id` set iff state == processing).
    pub fn start(&mut self, worker_id: impl Into<String>, now: DateTime<Utc>) -> Result<(), JobInvariantError> {
        if self.status.is_terminal() {
            return Err(JobInvariantError::Terminal(self.id.clone()));
        }
        self.status = JobStatus::Processing;
        self.worker_id = Some(worker_id.into());
        self.started_at = Some(now);
        self.stage = "start".to_string();
        self.updated_at = now;
        Ok(())
    }

    /// Applies a progress update, enforcing the monotonic-within-epoch
    /// invariant (spec §8 invariant 1).
    pub fn apply_progress(
        &mut self,
        percentage: f64,
        stage: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), JobInvariantError> {
        if !(0.0..=100.0).contains(&percentage) {
            return Err(JobInvariantError::ProgressOutOfRange(percentage));
        }
        if percentage < self.progress {
            return Err(JobInvariantError::ProgressRegression {
                old: self.progress as u32,
                new: percentage as u32,
            });
        }
        self.progress = percentage;
        self.stage = stage.to_string();
        self.status_message = message.to_string();
        self.updated_at = now;
        Ok(())
    }

    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), JobInvariantError> {
        if self.status.is_terminal() {
            return Err(JobInvariantError::Terminal(self.id.clone()));
        }
        self.status = JobStatus::Completed;
        self.progress = 100.0;
        self.stage = "completed".to_string();
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn fail(&mut self, error_message: impl Into<String>, now: DateTime<Utc>) -> Result<(), JobInvariantError> {
        if self.status.is_terminal() {
            return Err(JobInvariantError::Terminal(self.id.clone()));
        }
        self.status = JobStatus::Failed;
        self.stage = "failed".to_string();
        self.error_message = Some(error_message.into());
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), JobInvariantError> {
        if self.status.is_terminal() {
            return Err(JobInvariantError::Terminal(self.id.clone()));
        }
        self.status = JobStatus::Cancelled;
        self.stage = "cancelled".to_string();
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Resets a failed job for another attempt, keeping identity but
    /// starting a new processing epoch (spec §4.J "each retry resets the
    /// child's processing epoch but keeps identity").
    pub fn reset_for_retry(&mut self, now: DateTime<Utc>) {
        self.status = JobStatus::Queued;
        self.progress = 0.0;
        self.stage = "queued".to_string();
        self.status_message = String::new();
        self.worker_id = None;
        self.started_at = None;
        self.completed_at = None;
        self.error_message = None;
        self.retry_count += 1;
        self.updated_at = now;
    }
}
