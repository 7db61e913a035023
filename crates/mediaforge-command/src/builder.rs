//! Assembles a validated argv for the external transcoding tool, grounded on
//! `FFmpegCommandBuilder.build_command` and its `_handle_*` operation
//! dispatch.

use crate::hardware::HardwareCapabilities;
use crate::operations::{Operation, OutputOptions};
use crate::validate::{self, CompatibilityWarning};
use mediaforge_core::Error;

/// A fully assembled, vetted command: ready to hand to `Command::new(argv[0])
/// .args(&argv[1..])` (or its async equivalent) without further inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltCommand {
    pub argv: Vec<String>,
}

pub struct CommandBuilder<'a> {
    capabilities: &'a HardwareCapabilities,
    binary: String,
}

impl<'a> CommandBuilder<'a> {
    pub fn new(capabilities: &'a HardwareCapabilities) -> Self {
        Self { capabilities, binary: "ffmpeg".to_string() }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Validates every operation and option, then builds the argv. Returns
    /// the command plus any non-fatal compatibility warnings.
    pub fn build(
        &self,
        input_path: &str,
        output_path: &str,
        options: &OutputOptions,
        operations: &[Operation],
    ) -> Result<(BuiltCommand, Vec<CompatibilityWarning>), Error> {
        validate::validate_path("input_path", input_path)?;
        validate::validate_path("output_path", output_path)?;
        validate::validate_options(options)?;
        for operation in operations {
            validate::validate_operation(operation)?;
        }

        let mut argv = vec![self.binary.clone(), "-y".to_string(), "-hide_banner".to_string()];

        // ffmpeg treats `-hwaccel` as an input option: it must come before
        // `-i`, not after, so the encoder is picked up front and its
        // hwaccel flags (if any) are prepended here rather than alongside
        // the rest of the output options.
        let encoder = options.codec().map(|codec| self.capabilities.best_encoder(codec));
        if let Some(encoder) = &encoder {
            if encoder.vendor != "software" {
                self.add_hardware_acceleration(&mut argv, encoder.vendor);
            }
        }

        for operation in operations {
            if let Operation::Trim(trim) = operation {
                argv.push("-ss".to_string());
                argv.push(format!("{:.3}", trim.start_seconds));
            }
        }

        argv.push("-i".to_string());
        argv.push(input_path.to_string());

        for operation in operations {
            if let Operation::Watermark(watermark) = operation {
                argv.push("-i".to_string());
                argv.push(watermark.image_path.clone());
            }
        }

        self.add_global_options(&mut argv, options, encoder);

        let mut filter_graph = Vec::new();
        for operation in operations {
            self.handle_operation(operation, &mut argv, &mut filter_graph);
        }
        if !filter_graph.is_empty() {
            argv.push("-filter_complex".to_string());
            argv.push(filter_graph.join(","));
        }

        if let Some(trim) = operations.iter().find_map(|op| match op {
            Operation::Trim(t) => Some(t),
            _ => None,
        }) {
            if let Some(duration) = trim.duration_seconds {
                argv.push("-t".to_string());
                argv.push(format!("{duration:.3}"));
            }
        }

        argv.push(output_path.to_string());

        let warnings = validate::compatibility_warnings(options);
        Ok((BuiltCommand { argv }, warnings))
    }

    fn add_global_options(&self, argv: &mut Vec<String>, options: &OutputOptions, encoder: Option<crate::hardware::Encoder>) {
        if let Some(encoder) = encoder {
            argv.push("-c:v".to_string());
            argv.push(encoder.name);
        } else if let Some(codec) = &options.video_codec {
            argv.push("-c:v".to_string());
            argv.push(codec.clone());
        }
        if let Some(codec) = &options.audio_codec {
            argv.push("-c:a".to_string());
            argv.push(codec.clone());
        }
        if let Some(quality) = options.quality {
            argv.push("-crf".to_string());
            argv.push(quality.to_string());
        }
        if let (Some(w), Some(h)) = (options.width, options.height) {
            argv.push("-vf".to_string());
            argv.push(format!("scale={w}:{h}"));
        }
        if let Some(fps) = options.fps {
            argv.push("-r".to_string());
            argv.push(fps.to_string());
        }
        if let Some(kbps) = options.video_bitrate_kbps {
            argv.push("-b:v".to_string());
            argv.push(format!("{kbps}k"));
        }
        if let Some(kbps) = options.audio_bitrate_kbps {
            argv.push("-b:a".to_string());
            argv.push(format!("{kbps}k"));
        }
    }

    fn add_hardware_acceleration(&self, argv: &mut Vec<String>, vendor: &str) {
        match vendor {
            "nvenc" => {
                argv.push("-hwaccel".to_string());
                argv.push("cuda".to_string());
            }
            "qsv" => {
                argv.push("-hwaccel".to_string());
                argv.push("qsv".to_string());
            }
            "vaapi" => {
                argv.push("-hwaccel".to_string());
                argv.push("vaapi".to_string());
                argv.push("-vaapi_device".to_string());
                argv.push("/dev/dri/renderD128".to_string());
            }
            _ => {}
        }
    }

    fn handle_operation(&self, operation: &Operation, argv: &mut Vec<String>, filter_graph: &mut Vec<String>) {
        match operation {
            Operation::Transcode | Operation::Trim(_) => {}
            Operation::Watermark(watermark) => {
                let overlay = match watermark.position.as_str() {
                    "top-left" => "10:10",
                    "top-right" => "W-w-10:10",
                    "bottom-left" => "10:H-h-10",
                    "bottom-right" => "W-w-10:H-h-10",
                    _ => "(W-w)/2:(H-h)/2",
                };
                filter_graph.push(format!(
                    "[1:v]format=rgba,colorchannelmixer=aa={:.2}[wm];[0:v][wm]overlay={overlay}",
                    watermark.opacity
                ));
            }
            Operation::Filter(filter) => {
                let graph = match filter.name.as_str() {
                    "denoise" => "hqdn3d",
                    "sharpen" => "unsharp",
                    "deinterlace" => "yadif",
                    "stabilize" => "deshake",
                    "grayscale" => "hue=s=0",
                    _ => unreachable!("validated against the filter whitelist before reaching here"),
                };
                filter_graph.push(graph.to_string());
            }
            Operation::StreamMap(stream_map) => {
                for selector in &stream_map.selectors {
                    argv.push("-map".to_string());
                    argv.push(selector.clone());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::HardwareCapabilities;
    use crate::operations::{TrimParams, WatermarkParams};

    #[test]
    fn transcode_with_software_encoder() {
        let caps = HardwareCapabilities::default();
        let builder = CommandBuilder::new(&caps);
        let mut options = OutputOptions::container_only("mp4");
        options.video_codec = Some("h264".to_string());
        options.quality = Some(23);
        let (command, warnings) = builder.build("in.mp4", "out.mp4", &options, &[Operation::Transcode]).unwrap();
        assert!(warnings.is_empty());
        assert!(command.argv.contains(&"libx264".to_string()));
        assert!(command.argv.contains(&"-crf".to_string()));
    }

    #[test]
    fn trim_adds_seek_and_duration_flags() {
        let caps = HardwareCapabilities::default();
        let builder = CommandBuilder::new(&caps);
        let options = OutputOptions::container_only("mp4");
        let op = Operation::Trim(TrimParams { start_seconds: 5.0, duration_seconds: Some(10.0) });
        let (command, _) = builder.build("in.mp4", "out.mp4", &options, &[op]).unwrap();
        assert!(command.argv.contains(&"-ss".to_string()));
        assert!(command.argv.contains(&"-t".to_string()));
    }

    #[test]
    fn hardware_encoder_adds_hwaccel_flag() {
        let caps = HardwareCapabilities::from_encoder_names(["h264_nvenc".to_string()]);
        let builder = CommandBuilder::new(&caps);
        let mut options = OutputOptions::container_only("mp4");
        options.video_codec = Some("h264".to_string());
        let (command, _) = builder.build("in.mp4", "out.mp4", &options, &[Operation::Transcode]).unwrap();
        assert!(command.argv.contains(&"h264_nvenc".to_string()));
        assert!(command.argv.contains(&"-hwaccel".to_string()));

        // `-hwaccel` is an input option: ffmpeg requires it before `-i`.
        let hwaccel_pos = command.argv.iter().position(|a| a == "-hwaccel").unwrap();
        let input_pos = command.argv.iter().position(|a| a == "-i").unwrap();
        assert!(hwaccel_pos < input_pos, "-hwaccel must precede -i");
    }

    #[test]
    fn watermark_adds_second_input_and_overlay_filter() {
        let caps = HardwareCapabilities::default();
        let builder = CommandBuilder::new(&caps);
        let options = OutputOptions::container_only("mp4");
        let op = Operation::Watermark(WatermarkParams {
            image_path: "logo.png".to_string(),
            position: "bottom-right".to_string(),
            opacity: 0.8,
        });
        let (command, _) = builder.build("in.mp4", "out.mp4", &options, &[op]).unwrap();
        assert_eq!(command.argv.iter().filter(|a| *a == "-i").count(), 2);
        assert!(command.argv.contains(&"-filter_complex".to_string()));
    }

    #[test]
    fn invalid_operation_rejects_whole_build() {
        let caps = HardwareCapabilities::default();
        let builder = CommandBuilder::new(&caps);
        let options = OutputOptions::container_only("mp4");
        let op = Operation::Trim(TrimParams { start_seconds: -5.0, duration_seconds: None });
        assert!(builder.build("in.mp4", "out.mp4", &options, &[op]).is_err());
    }
}
