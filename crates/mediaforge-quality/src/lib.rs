//! VMAF/PSNR/SSIM parsing and bitrate-comparison quality scoring (spec §4.I
//! "Quality Analyzer"). All pure computation over strings/numbers already
//! produced by the external tool; running that tool and capturing its
//! output is `mediaforge-worker`'s job.

pub mod bitrate;
pub mod psnr_ssim;
pub mod report;
pub mod vmaf;

pub use bitrate::{calculate_bitrate_comparison, BitrateComparison};
pub use psnr_ssim::{parse_psnr_ssim, PsnrResult, PsnrSsimResult, SsimResult};
pub use report::{generate_quality_report, QualityGrade, QualityReport};
pub use vmaf::{parse_vmaf_log, percentile, VmafResult};
