//! Quality grading and advisory recommendations, grounded on
//! `QualityCalculator.generate_quality_report` (spec §4.I thresholds).

use crate::bitrate::BitrateComparison;
use crate::psnr_ssim::PsnrSsimResult;
use crate::vmaf::VmafResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityGrade {
    Excellent,
    VeryGood,
    Good,
    Fair,
    Poor,
}

impl QualityGrade {
    pub fn from_vmaf_mean(mean: f64) -> Self {
        if mean >= 95.0 {
            QualityGrade::Excellent
        } else if mean >= 80.0 {
            QualityGrade::VeryGood
        } else if mean >= 60.0 {
            QualityGrade::Good
        } else if mean >= 40.0 {
            QualityGrade::Fair
        } else {
            QualityGrade::Poor
        }
    }

    pub fn assessment(self) -> &'static str {
        match self {
            QualityGrade::Excellent => "Visually lossless quality",
            QualityGrade::VeryGood => "High quality with minimal artifacts",
            QualityGrade::Good => "Acceptable quality for most use cases",
            QualityGrade::Fair => "Noticeable quality degradation",
            QualityGrade::Poor => "Significant quality loss",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub overall_score: f64,
    pub quality_grade: QualityGrade,
    pub assessment: &'static str,
    pub recommendations: Vec<String>,
}

/// Builds the advisory report from whichever metrics are available. Every
/// input is optional because a caller may have only run a subset (e.g.
/// bitrate comparison without VMAF).
pub fn generate_quality_report(
    vmaf: Option<&VmafResult>,
    psnr_ssim: Option<&PsnrSsimResult>,
    bitrate: Option<&BitrateComparison>,
) -> QualityReport {
    let mut recommendations = Vec::new();

    let (overall_score, quality_grade, assessment) = match vmaf {
        Some(vmaf) => {
            let grade = QualityGrade::from_vmaf_mean(vmaf.mean);
            if vmaf.mean < 60.0 {
                recommendations.push("Consider increasing bitrate or using higher quality settings".to_string());
            }
            if vmaf.min < 30.0 {
                recommendations.push("Some frames have very low quality - check for scene complexity".to_string());
            }
            (vmaf.mean, grade, grade.assessment())
        }
        None => (0.0, QualityGrade::Poor, "Unable to generate assessment"),
    };

    if let Some(psnr_ssim) = psnr_ssim {
        if let Some(avg) = psnr_ssim.psnr.average {
            if avg < 30.0 {
                recommendations.push(format!("Low PSNR ({avg:.1}dB) indicates significant noise"));
            }
        }
    }

    if let Some(bitrate) = bitrate {
        if bitrate.compression_ratio > 10.0 {
            recommendations.push("Excellent compression efficiency achieved".to_string());
        } else if bitrate.compression_ratio < 2.0 {
            recommendations.push("Consider more aggressive compression settings".to_string());
        }
    }

    QualityReport { overall_score, quality_grade, assessment, recommendations }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vmaf_with(mean: f64, min: f64) -> VmafResult {
        VmafResult {
            mean,
            min,
            max: 100.0,
            percentile_1: min,
            percentile_5: min,
            percentile_95: mean,
            percentile_99: mean,
            frame_count: 10,
            scores: vec![mean; 10],
        }
    }

    #[test]
    fn excellent_grade_at_or_above_95() {
        assert_eq!(QualityGrade::from_vmaf_mean(95.0), QualityGrade::Excellent);
        assert_eq!(QualityGrade::from_vmaf_mean(94.9), QualityGrade::VeryGood);
    }

    #[test]
    fn poor_grade_below_40() {
        assert_eq!(QualityGrade::from_vmaf_mean(39.9), QualityGrade::Poor);
    }

    #[test]
    fn low_vmaf_adds_bitrate_recommendation() {
        let vmaf = vmaf_with(55.0, 50.0);
        let report = generate_quality_report(Some(&vmaf), None, None);
        assert!(report.recommendations.iter().any(|r| r.contains("bitrate")));
    }

    #[test]
    fn low_minimum_frame_score_warns_about_scene_complexity() {
        let vmaf = vmaf_with(90.0, 20.0);
        let report = generate_quality_report(Some(&vmaf), None, None);
        assert!(report.recommendations.iter().any(|r| r.contains("scene complexity")));
    }

    #[test]
    fn excellent_compression_ratio_is_called_out() {
        let bitrate = BitrateComparison {
            reference_bitrate: 1000,
            test_bitrate: 100,
            bitrate_reduction_percent: 90.0,
            reference_size: 10_000,
            test_size: 500,
            size_reduction_percent: 95.0,
            compression_ratio: 20.0,
        };
        let report = generate_quality_report(None, None, Some(&bitrate));
        assert!(report.recommendations.iter().any(|r| r.contains("Excellent compression")));
    }

    #[test]
    fn no_metrics_yields_no_recommendations() {
        let report = generate_quality_report(None, None, None);
        assert!(report.recommendations.is_empty());
        assert_eq!(report.assessment, "Unable to generate assessment");
    }
}
