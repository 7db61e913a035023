//! Per-job processing timeout derivation (spec §4.H step 3: "compute
//! timeout = clamp(10× duration_sec + operation_surcharges, 300, 14400)").

use mediaforge_command::Operation;
use std::time::Duration;

const MIN_SECONDS: f64 = 300.0;
const MAX_SECONDS: f64 = 14_400.0;

/// Flat per-operation time surcharge, in seconds; operations like
/// watermarking or quality-filter passes add real wall-clock cost beyond
/// straight transcoding.
fn surcharge(operation: &Operation) -> f64 {
    match operation {
        Operation::Transcode => 0.0,
        Operation::Trim(_) => 0.0,
        Operation::Watermark(_) => 30.0,
        Operation::Filter(_) => 60.0,
        Operation::StreamMap(_) => 120.0,
    }
}

pub fn processing_timeout(duration_seconds: f64, operations: &[Operation]) -> Duration {
    let surcharges: f64 = operations.iter().map(surcharge).sum();
    let seconds = (10.0 * duration_seconds + surcharges).clamp(MIN_SECONDS, MAX_SECONDS);
    Duration::from_secs_f64(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_input_clamps_to_minimum() {
        let timeout = processing_timeout(1.0, &[]);
        assert_eq!(timeout, Duration::from_secs_f64(300.0));
    }

    #[test]
    fn long_input_clamps_to_maximum() {
        let timeout = processing_timeout(10_000.0, &[]);
        assert_eq!(timeout, Duration::from_secs_f64(14_400.0));
    }

    #[test]
    fn operations_add_surcharge_within_bounds() {
        let timeout = processing_timeout(100.0, &[Operation::StreamMap(mediaforge_command::operations::StreamMapParams {
            selectors: vec!["0:v:0".to_string()],
        })]);
        assert_eq!(timeout, Duration::from_secs_f64(1000.0 + 120.0));
    }
}
