//! Bitrate/size comparison, grounded on
//! `QualityCalculator.calculate_bitrate_comparison`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BitrateComparison {
    pub reference_bitrate: u64,
    pub test_bitrate: u64,
    pub bitrate_reduction_percent: f64,
    pub reference_size: u64,
    pub test_size: u64,
    pub size_reduction_percent: f64,
    pub compression_ratio: f64,
}

pub fn calculate_bitrate_comparison(
    reference_bitrate: u64,
    test_bitrate: u64,
    reference_size: u64,
    test_size: u64,
) -> BitrateComparison {
    let bitrate_reduction_percent = if reference_bitrate > 0 {
        (reference_bitrate as f64 - test_bitrate as f64) / reference_bitrate as f64 * 100.0
    } else {
        0.0
    };
    let size_reduction_percent = if reference_size > 0 {
        (reference_size as f64 - test_size as f64) / reference_size as f64 * 100.0
    } else {
        0.0
    };
    let compression_ratio = if test_size > 0 { reference_size as f64 / test_size as f64 } else { 0.0 };

    BitrateComparison {
        reference_bitrate,
        test_bitrate,
        bitrate_reduction_percent,
        reference_size,
        test_size,
        size_reduction_percent,
        compression_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_reductions_and_ratio() {
        let result = calculate_bitrate_comparison(1000, 500, 10_000, 4_000);
        assert_eq!(result.bitrate_reduction_percent, 50.0);
        assert_eq!(result.size_reduction_percent, 60.0);
        assert_eq!(result.compression_ratio, 2.5);
    }

    #[test]
    fn zero_reference_bitrate_avoids_division_by_zero() {
        let result = calculate_bitrate_comparison(0, 500, 0, 4_000);
        assert_eq!(result.bitrate_reduction_percent, 0.0);
    }

    #[test]
    fn zero_test_size_yields_zero_ratio() {
        let result = calculate_bitrate_comparison(1000, 500, 10_000, 0);
        assert_eq!(result.compression_ratio, 0.0);
    }
}
