//! The same `(input, output, options, operations)` tuple yields
//! byte-identical argv on every build, given the same hardware capabilities
//! (spec §8 "Command Builder: ... yields byte-identical argv modulo the
//! hardware-acceleration prefix chosen by the probe").

use mediaforge_command::{CommandBuilder, HardwareCapabilities, Operation, OutputOptions};
use proptest::prelude::*;

fn options_for(codec: &str, quality: u8, fps: u32, width: u32, height: u32) -> OutputOptions {
    let mut options = OutputOptions::container_only("mp4");
    options.video_codec = Some(codec.to_string());
    options.quality = Some(quality);
    options.fps = Some(fps);
    options.width = Some(width);
    options.height = Some(height);
    options
}

proptest! {
    #[test]
    fn build_is_deterministic_for_a_fixed_tuple(
        codec in prop::sample::select(vec!["h264", "h265", "av1"]),
        quality in 0u8..=51,
        fps in 1u32..=240,
        width in 1u32..=8192,
        height in 1u32..=8192,
    ) {
        let caps = HardwareCapabilities::default();
        let builder = CommandBuilder::new(&caps);
        let options = options_for(codec, quality, fps, width, height);
        let operations = [Operation::Transcode];

        let (first, _) = builder.build("in.mp4", "out.mp4", &options, &operations).unwrap();
        let (second, _) = builder.build("in.mp4", "out.mp4", &options, &operations).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_quality_is_always_rejected(quality in 52u8..=255u8) {
        let caps = HardwareCapabilities::default();
        let builder = CommandBuilder::new(&caps);
        let mut options = OutputOptions::container_only("mp4");
        options.video_codec = Some("h264".to_string());
        options.quality = Some(quality);
        let result = builder.build("in.mp4", "out.mp4", &options, &[Operation::Transcode]);
        prop_assert!(result.is_err(), "crf {} outside 0..=51 must be rejected", quality);
    }
}
