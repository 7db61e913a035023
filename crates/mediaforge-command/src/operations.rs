//! Typed operation and option payloads, grounded on the `_handle_*`
//! dispatch methods of `FFmpegCommandBuilder.build_command`.

use crate::hardware::Codec;

/// Output-level options applied regardless of which operations run
/// (spec §3 job options: codec, quality, resolution, fps, bitrate).
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub container: String,
    pub video_codec: Option<String>,
    pub audio_codec: Option<String>,
    /// CRF-style quality, 0-51 (lower is higher quality).
    pub quality: Option<u8>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub video_bitrate_kbps: Option<u32>,
    pub audio_bitrate_kbps: Option<u32>,
}

impl OutputOptions {
    pub fn container_only(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            video_codec: None,
            audio_codec: None,
            quality: None,
            width: None,
            height: None,
            fps: None,
            video_bitrate_kbps: None,
            audio_bitrate_kbps: None,
        }
    }

    pub(crate) fn codec(&self) -> Option<Codec> {
        match self.video_codec.as_deref() {
            Some("h264") | Some("libx264") => Some(Codec::H264),
            Some("h265") | Some("hevc") | Some("libx265") => Some(Codec::H265),
            Some("av1") => Some(Codec::Av1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrimParams {
    /// Seek offset in seconds, applied before the input for fast seeking.
    pub start_seconds: f64,
    pub duration_seconds: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct WatermarkParams {
    pub image_path: String,
    /// One of `top-left`, `top-right`, `bottom-left`, `bottom-right`, `center`.
    pub position: String,
    pub opacity: f64,
}

#[derive(Debug, Clone)]
pub struct FilterParams {
    /// e.g. `denoise`, `sharpen`, `deinterlace`; validated against a
    /// whitelist, never passed through as a raw filter graph string.
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct StreamMapParams {
    /// Explicit `-map` selectors, e.g. `0:v:0`, `0:a:1`.
    pub selectors: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum Operation {
    Transcode,
    Trim(TrimParams),
    Watermark(WatermarkParams),
    Filter(FilterParams),
    StreamMap(StreamMapParams),
}

impl Operation {
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::Transcode => "transcode",
            Operation::Trim(_) => "trim",
            Operation::Watermark(_) => "watermark",
            Operation::Filter(_) => "filter",
            Operation::StreamMap(_) => "stream_map",
        }
    }
}
