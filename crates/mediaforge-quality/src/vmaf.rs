//! VMAF JSON-log parsing and percentile aggregation, grounded on
//! `QualityCalculator._parse_vmaf_log` and `_percentile`.

use mediaforge_core::Error;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VmafResult {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub percentile_1: f64,
    pub percentile_5: f64,
    pub percentile_95: f64,
    pub percentile_99: f64,
    pub frame_count: usize,
    /// The first 100 per-frame scores, kept for spot analysis; the
    /// original truncates the same way to keep the report payload bounded.
    pub scores: Vec<f64>,
}

/// Linear-interpolated percentile over a sorted copy of `data`. Matches the
/// original's index-interpolation exactly rather than a nearest-rank
/// method.
pub fn percentile(data: &[f64], pct: f64) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let index = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    if index.fract() == 0.0 {
        return sorted[lower];
    }
    let upper = (lower + 1).min(sorted.len() - 1);
    sorted[lower] + (sorted[upper] - sorted[lower]) * index.fract()
}

/// Parses the JSON log libvmaf writes via `log_fmt=json`. Each frame object
/// looks like `{"frameNum": 0, "metrics": {"vmaf": 94.2, ...}}`.
pub fn parse_vmaf_log(log_json: &str) -> Result<VmafResult, Error> {
    let parsed: serde_json::Value =
        serde_json::from_str(log_json).map_err(|e| Error::processing(format!("failed to parse VMAF log: {e}")))?;

    let frames = parsed
        .get("frames")
        .and_then(|f| f.as_array())
        .ok_or_else(|| Error::processing("no VMAF data found in log file"))?;

    let scores: Vec<f64> = frames
        .iter()
        .filter_map(|frame| frame.get("metrics")?.get("vmaf")?.as_f64())
        .collect();

    if scores.is_empty() {
        return Err(Error::processing("no VMAF scores found in log file"));
    }

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    Ok(VmafResult {
        mean,
        min,
        max,
        percentile_1: percentile(&scores, 1.0),
        percentile_5: percentile(&scores, 5.0),
        percentile_95: percentile(&scores, 95.0),
        percentile_99: percentile(&scores, 99.0),
        frame_count: scores.len(),
        scores: scores.into_iter().take(100).collect(),
    })
}
