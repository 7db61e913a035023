//! Typed processing-stats payload persisted alongside a job's progress
//! (spec §4.G), grounded on the `processing_stats` dict built in
//! `ProgressTracker.update`.

use crate::parser::ProgressSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessingStats {
    pub current_frame: Option<u64>,
    pub fps: Option<f64>,
    pub bitrate: Option<f64>,
    pub speed: Option<f64>,
    pub time_processed: Option<f64>,
    pub last_update: Option<DateTime<Utc>>,
}

impl ProcessingStats {
    /// Merges a freshly parsed sample over the previous stats, the same way
    /// the original's `processing_stats.update({...})` only overwrites the
    /// keys the sample actually carried.
    pub fn merged_with(&self, sample: &ProgressSample, now: DateTime<Utc>) -> Self {
        Self {
            current_frame: sample.frame.or(self.current_frame),
            fps: sample.fps.or(self.fps),
            bitrate: sample.bitrate_kbps.or(self.bitrate),
            speed: sample.speed.or(self.speed),
            time_processed: sample.time_seconds.or(self.time_processed),
            last_update: Some(now),
        }
    }
}
