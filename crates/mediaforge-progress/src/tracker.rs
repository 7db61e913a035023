//! Throttled progress updates for a single job, grounded on
//! `ProgressTracker` (spec §4.G).
//!
//! The tracker itself holds no storage handle; it decides *whether* an
//! update should be written and builds the record to write, then hands it
//! to a [`ProgressSink`]. The sink is what actually persists the record and
//! invalidates any cached job snapshot (`delete_pattern` in the original),
//! which keeps this crate free of a dependency on `mediaforge-cache` or a
//! job repository.

use crate::parser::ProgressSample;
use crate::stats::ProcessingStats;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Minimum time between throttled writes, absent a forcing condition.
const UPDATE_INTERVAL_SECONDS: f64 = 2.0;
/// A percentage jump at least this large forces a write even inside the
/// interval.
const FORCE_DELTA: f64 = 5.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub job_id: String,
    pub percentage: f64,
    pub stage: String,
    pub message: String,
    pub stats: Option<ProcessingStats>,
    pub at: DateTime<Utc>,
}

/// Receives the updates the tracker decides to emit. Implementations
/// persist the record (job row, cache entry) and invalidate any cached
/// snapshot for the job.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn record(&self, update: ProgressUpdate);
    async fn record_failure(&self, job_id: &str, error_message: &str, at: DateTime<Utc>);
}

pub struct ProgressTracker<S: ProgressSink> {
    job_id: String,
    sink: S,
    last_update: DateTime<Utc>,
    last_percentage: f64,
    stats: ProcessingStats,
}

impl<S: ProgressSink> ProgressTracker<S> {
    pub fn new(job_id: impl Into<String>, sink: S, now: DateTime<Utc>) -> Self {
        Self {
            job_id: job_id.into(),
            sink,
            last_update: now,
            last_percentage: 0.0,
            stats: ProcessingStats::default(),
        }
    }

    fn should_force(&self, percentage: f64, now: DateTime<Utc>) -> bool {
        let time_since_last = (now - self.last_update).num_milliseconds() as f64 / 1000.0;
        percentage >= 100.0
            || (percentage - self.last_percentage).abs() >= FORCE_DELTA
            || time_since_last >= UPDATE_INTERVAL_SECONDS
    }

    /// Updates progress, throttled the same way the original was: only
    /// writes when the update is forced by completion, a large jump, or
    /// enough elapsed time. Returns whether a write actually happened.
    pub async fn update(
        &mut self,
        percentage: f64,
        stage: &str,
        message: &str,
        sample: Option<ProgressSample>,
        now: DateTime<Utc>,
    ) -> bool {
        if !self.should_force(percentage, now) {
            return false;
        }

        let percentage = percentage.clamp(0.0, 100.0);
        if let Some(sample) = &sample {
            self.stats = self.stats.merged_with(sample, now);
        }

        self.sink
            .record(ProgressUpdate {
                job_id: self.job_id.clone(),
                percentage,
                stage: stage.to_string(),
                message: message.to_string(),
                stats: sample.map(|_| self.stats.clone()),
                at: now,
            })
            .await;

        self.last_update = now;
        self.last_percentage = percentage;
        true
    }

    /// Handles one FFmpeg progress sample: derives a message from whichever
    /// fields are present and feeds it through `update`.
    pub async fn ffmpeg_callback(&mut self, sample: ProgressSample, now: DateTime<Utc>) -> bool {
        let percentage = sample.percentage.unwrap_or(0.0);
        let mut parts = Vec::new();
        if let Some(frame) = sample.frame {
            parts.push(format!("Frame {frame}"));
        }
        if let Some(fps) = sample.fps {
            parts.push(format!("FPS {fps:.1}"));
        }
        if let Some(speed) = sample.speed {
            parts.push(format!("Speed {speed:.1}x"));
        }
        if let Some(bitrate) = sample.bitrate_kbps {
            parts.push(format!("Bitrate {bitrate:.1}kbps"));
        }
        let message = if parts.is_empty() { "Processing video".to_string() } else { parts.join(" | ") };
        self.update(percentage, "processing", &message, Some(sample), now).await
    }

    pub async fn set_stage(&mut self, stage: &str, message: &str, now: DateTime<Utc>) -> bool {
        let percentage = self.last_percentage;
        self.update(percentage, stage, message, None, now).await
    }

    pub async fn complete(&mut self, message: &str, now: DateTime<Utc>) -> bool {
        self.update(100.0, "completed", message, None, now).await
    }

    pub async fn error(&mut self, error_message: &str, now: DateTime<Utc>) {
        self.sink.record_failure(&self.job_id, error_message, now).await;
    }
}
