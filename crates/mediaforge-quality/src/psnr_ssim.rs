//! PSNR/SSIM stderr parsing, grounded on
//! `QualityCalculator._parse_psnr_ssim_output`. Regex vocabulary kept
//! verbatim to match the tool's actual `psnr`/`ssim` filter log format.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PSNR_AVERAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)PSNR.*?average:(\d+\.?\d*)").unwrap());
static SSIM_AVERAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)SSIM.*?All:(\d+\.?\d*)").unwrap());
static PSNR_Y: Lazy<Regex> = Lazy::new(|| Regex::new(r"PSNR y:(\d+\.?\d*)").unwrap());
static PSNR_U: Lazy<Regex> = Lazy::new(|| Regex::new(r"u:(\d+\.?\d*)").unwrap());
static PSNR_V: Lazy<Regex> = Lazy::new(|| Regex::new(r"v:(\d+\.?\d*)").unwrap());

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PsnrResult {
    pub average: Option<f64>,
    pub y: Option<f64>,
    pub u: Option<f64>,
    pub v: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SsimResult {
    pub average: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PsnrSsimResult {
    pub psnr: PsnrResult,
    pub ssim: SsimResult,
}

fn capture_f64(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text).and_then(|c| c[1].parse().ok())
}

/// Parses the combined stderr text a single `-lavfi psnr=...:ssim=...`
/// invocation produces.
pub fn parse_psnr_ssim(stderr_text: &str) -> PsnrSsimResult {
    PsnrSsimResult {
        psnr: PsnrResult {
            average: capture_f64(&PSNR_AVERAGE, stderr_text),
            y: capture_f64(&PSNR_Y, stderr_text),
            u: capture_f64(&PSNR_U, stderr_text),
            v: capture_f64(&PSNR_V, stderr_text),
        },
        ssim: SsimResult { average: capture_f64(&SSIM_AVERAGE, stderr_text) },
    }
}
