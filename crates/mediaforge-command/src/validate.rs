//! Pre-build validation: rejects anything that would let an operation
//! description smuggle shell metacharacters or out-of-range values into the
//! eventual argv, and flags non-fatal container/codec mismatches.
//!
//! The spec's operation whitelist is `{transcode, trim, watermark, filter,
//! stream_map}` (§4.F); anything else is rejected before a single argument
//! is built.

use crate::operations::{FilterParams, Operation, OutputOptions};
use mediaforge_core::Error;

const INJECTION_CHARS: &[char] = &[';', '&', '|', '$', '`', '\n', '\r', '>', '<'];

const ALLOWED_FILTERS: &[&str] = &["denoise", "sharpen", "deinterlace", "stabilize", "grayscale"];

const ALLOWED_VIDEO_CODECS: &[&str] = &["h264", "h265", "hevc", "av1", "vp8", "libx264", "libx265", "vp9", "copy"];
const ALLOWED_AUDIO_CODECS: &[&str] = &["aac", "mp3", "opus", "flac", "pcm", "copy"];
const ALLOWED_CONTAINERS: &[&str] = &["mp4", "mov", "mkv", "webm", "ts", "m3u8"];

fn reject_injection(field: &str, value: &str) -> Result<(), Error> {
    if value.chars().any(|c| INJECTION_CHARS.contains(&c)) {
        return Err(Error::validation(format!("{field} contains disallowed characters")));
    }
    Ok(())
}

pub fn validate_path(field: &str, path: &str) -> Result<(), Error> {
    reject_injection(field, path)?;
    if path.is_empty() {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    if path.contains("..") {
        return Err(Error::security(format!("{field} must not contain parent-directory references")));
    }
    if path.contains('\0') {
        return Err(Error::security(format!("{field} must not contain a null byte")));
    }
    Ok(())
}

pub fn validate_options(options: &OutputOptions) -> Result<(), Error> {
    if !ALLOWED_CONTAINERS.contains(&options.container.as_str()) {
        return Err(Error::validation(format!("unsupported container: {}", options.container)));
    }
    if let Some(codec) = &options.video_codec {
        reject_injection("video_codec", codec)?;
        if !ALLOWED_VIDEO_CODECS.contains(&codec.as_str()) {
            return Err(Error::validation(format!("unsupported video codec: {codec}")));
        }
    }
    if let Some(codec) = &options.audio_codec {
        reject_injection("audio_codec", codec)?;
        if !ALLOWED_AUDIO_CODECS.contains(&codec.as_str()) {
            return Err(Error::validation(format!("unsupported audio codec: {codec}")));
        }
    }
    if let Some(quality) = options.quality {
        if quality > 51 {
            return Err(Error::validation("quality must be between 0 and 51"));
        }
    }
    if let Some(fps) = options.fps {
        if !(1..=240).contains(&fps) {
            return Err(Error::validation("fps must be between 1 and 240"));
        }
    }
    for (field, dim) in [("width", options.width), ("height", options.height)] {
        if let Some(v) = dim {
            if !(1..=8192).contains(&v) {
                return Err(Error::validation(format!("{field} must be between 1 and 8192")));
            }
        }
    }
    Ok(())
}

pub fn validate_operation(operation: &Operation) -> Result<(), Error> {
    match operation {
        Operation::Transcode => Ok(()),
        Operation::Trim(params) => {
            if params.start_seconds < 0.0 {
                return Err(Error::validation("trim start must be non-negative"));
            }
            if let Some(duration) = params.duration_seconds {
                if duration <= 0.0 {
                    return Err(Error::validation("trim duration must be positive"));
                }
            }
            Ok(())
        }
        Operation::Watermark(params) => {
            validate_path("watermark image_path", &params.image_path)?;
            const POSITIONS: &[&str] = &["top-left", "top-right", "bottom-left", "bottom-right", "center"];
            if !POSITIONS.contains(&params.position.as_str()) {
                return Err(Error::validation(format!("unsupported watermark position: {}", params.position)));
            }
            if !(0.0..=1.0).contains(&params.opacity) {
                return Err(Error::validation("watermark opacity must be between 0.0 and 1.0"));
            }
            Ok(())
        }
        Operation::Filter(params) => validate_filter(params),
        Operation::StreamMap(params) => {
            if params.selectors.is_empty() {
                return Err(Error::validation("stream_map requires at least one selector"));
            }
            for selector in &params.selectors {
                reject_injection("stream_map selector", selector)?;
            }
            Ok(())
        }
    }
}

fn validate_filter(params: &FilterParams) -> Result<(), Error> {
    if !ALLOWED_FILTERS.contains(&params.name.as_str()) {
        return Err(Error::validation(format!("unsupported filter: {}", params.name)));
    }
    Ok(())
}

/// A non-fatal advisory surfaced alongside a successfully built command,
/// e.g. a codec that technically works but is a poor fit for the chosen
/// container. Never blocks the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityWarning(pub String);

pub fn compatibility_warnings(options: &OutputOptions) -> Vec<CompatibilityWarning> {
    let mut warnings = Vec::new();
    if options.container == "webm" {
        if let Some(codec) = &options.video_codec {
            if !matches!(codec.as_str(), "vp9" | "av1" | "copy") {
                warnings.push(CompatibilityWarning(format!(
                    "{codec} is not a native WebM codec; most players will reject this output"
                )));
            }
        }
        if let Some(codec) = &options.audio_codec {
            if !matches!(codec.as_str(), "opus" | "copy") {
                warnings.push(CompatibilityWarning(format!(
                    "{codec} is not a native WebM audio codec; prefer opus"
                )));
            }
        }
    }
    if options.container == "mp4" && options.video_codec.as_deref() == Some("vp9") {
        warnings.push(CompatibilityWarning("vp9 in an mp4 container has limited player support".to_string()));
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operations::TrimParams;

    #[test]
    fn rejects_shell_metacharacters_in_path() {
        assert!(validate_path("input_path", "/tmp/in.mp4; rm -rf /").is_err());
    }

    #[test]
    fn rejects_parent_directory_traversal() {
        let err = validate_path("input_path", "../../etc/passwd").unwrap_err();
        assert!(err.is_security());
    }

    #[test]
    fn rejects_null_byte_as_security_violation() {
        let err = validate_path("input_path", "/tmp/in\0.mp4").unwrap_err();
        assert!(err.is_security());
    }

    #[test]
    fn accepts_safe_path() {
        assert!(validate_path("input_path", "/tmp/jobs/abc/input.mp4").is_ok());
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        let mut options = OutputOptions::container_only("mp4");
        options.quality = Some(52);
        assert!(validate_options(&options).is_err());
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let op = Operation::Filter(FilterParams { name: "magic".to_string() });
        assert!(validate_operation(&op).is_err());
    }

    #[test]
    fn negative_trim_start_is_rejected() {
        let op = Operation::Trim(TrimParams { start_seconds: -1.0, duration_seconds: None });
        assert!(validate_operation(&op).is_err());
    }

    #[test]
    fn webm_with_h264_warns_but_does_not_fail() {
        let mut options = OutputOptions::container_only("webm");
        options.video_codec = Some("h264".to_string());
        assert!(validate_options(&options).is_ok());
        let warnings = compatibility_warnings(&options);
        assert_eq!(warnings.len(), 1);
    }
}
