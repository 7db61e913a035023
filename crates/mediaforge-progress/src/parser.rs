//! FFmpeg stderr progress-line parsing, grounded on
//! `FFmpegProgressParser.parse_progress`. The regex vocabulary is kept
//! verbatim; it matches the tool's actual stderr format, not a convention
//! of ours.

use once_cell::sync::Lazy;
use regex::Regex;

static FRAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"frame=\s*(\d+)").unwrap());
static FPS: Lazy<Regex> = Lazy::new(|| Regex::new(r"fps=\s*([\d.]+)").unwrap());
static TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"time=(\d{2}):(\d{2}):(\d{2})\.(\d{2})").unwrap());
static BITRATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"bitrate=\s*([\d.]+)kbits/s").unwrap());
static SPEED: Lazy<Regex> = Lazy::new(|| Regex::new(r"speed=\s*([\d.]+)x").unwrap());

/// A single parsed progress line. Any field may be absent; the tool
/// doesn't print every field on every line.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressSample {
    pub frame: Option<u64>,
    pub fps: Option<f64>,
    pub time_seconds: Option<f64>,
    pub bitrate_kbps: Option<f64>,
    pub speed: Option<f64>,
    pub percentage: Option<f64>,
}

impl ProgressSample {
    fn is_empty(&self) -> bool {
        self.frame.is_none()
            && self.fps.is_none()
            && self.time_seconds.is_none()
            && self.bitrate_kbps.is_none()
            && self.speed.is_none()
    }
}

/// Parses one line of FFmpeg stderr output. `total_duration_seconds`, if
/// known, is used to derive a completion percentage from the parsed time.
/// Returns `None` for blank lines or lines carrying none of the recognized
/// fields.
pub fn parse_progress(line: &str, total_duration_seconds: Option<f64>) -> Option<ProgressSample> {
    if line.trim().is_empty() {
        return None;
    }

    let mut sample = ProgressSample::default();

    if let Some(m) = FRAME.captures(line) {
        sample.frame = m[1].parse().ok();
    }
    if let Some(m) = FPS.captures(line) {
        sample.fps = m[1].parse().ok();
    }
    if let Some(m) = TIME.captures(line) {
        let hours: f64 = m[1].parse().ok()?;
        let minutes: f64 = m[2].parse().ok()?;
        let seconds: f64 = m[3].parse().ok()?;
        let centiseconds: f64 = m[4].parse().ok()?;
        let total = hours * 3600.0 + minutes * 60.0 + seconds + centiseconds / 100.0;
        sample.time_seconds = Some(total);
        if let Some(duration) = total_duration_seconds {
            if duration > 0.0 {
                sample.percentage = Some((total / duration * 100.0).min(100.0));
            }
        }
    }
    if let Some(m) = BITRATE.captures(line) {
        sample.bitrate_kbps = m[1].parse().ok();
    }
    if let Some(m) = SPEED.captures(line) {
        sample.speed = m[1].parse().ok();
    }

    if sample.is_empty() {
        None
    } else {
        Some(sample)
    }
}
