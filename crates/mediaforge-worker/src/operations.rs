//! Translates the wire operation/option schema (spec §6 "Operation schema")
//! into the typed [`mediaforge_command::Operation`]/[`OutputOptions`] the
//! command builder expects.

use mediaforge_command::operations::{FilterParams, StreamMapParams, TrimParams, WatermarkParams};
use mediaforge_command::{Operation, OutputOptions};
use mediaforge_core::Error;
use serde_json::Value;

fn str_field<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(|v| v.as_str())
}

fn f64_field(obj: &Value, key: &str) -> Option<f64> {
    obj.get(key).and_then(|v| v.as_f64())
}

fn u64_field(obj: &Value, key: &str) -> Option<u64> {
    obj.get(key).and_then(|v| v.as_u64())
}

pub fn parse_operations(operations: &Value) -> Result<Vec<Operation>, Error> {
    let entries = operations.as_array().ok_or_else(|| Error::validation("operations must be an array"))?;
    entries.iter().map(parse_operation).collect()
}

fn parse_operation(entry: &Value) -> Result<Operation, Error> {
    let obj = entry.as_object().ok_or_else(|| Error::validation("each operation must be an object"))?;
    let (kind, params) = obj
        .iter()
        .next()
        .ok_or_else(|| Error::validation("operation object must name exactly one kind"))?;

    match kind.as_str() {
        "transcode" => Ok(Operation::Transcode),
        "trim" => {
            let start = f64_field(params, "start").ok_or_else(|| Error::validation("trim.start is required"))?;
            let duration = f64_field(params, "duration");
            if duration == Some(0.0) {
                return Err(Error::validation("trim.duration must not be zero"));
            }
            Ok(Operation::Trim(TrimParams { start_seconds: start, duration_seconds: duration }))
        }
        "watermark" => {
            let image_path = str_field(params, "image").ok_or_else(|| Error::validation("watermark.image is required"))?;
            Ok(Operation::Watermark(WatermarkParams {
                image_path: image_path.to_string(),
                position: str_field(params, "position").unwrap_or("bottom-right").to_string(),
                opacity: f64_field(params, "opacity").unwrap_or(1.0),
            }))
        }
        "filter" => {
            let name = str_field(params, "name").ok_or_else(|| Error::validation("filter.name is required"))?;
            Ok(Operation::Filter(FilterParams { name: name.to_string() }))
        }
        "stream" => {
            let variants = params
                .get("variants")
                .and_then(|v| v.as_array())
                .map(|variants| {
                    variants
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default();
            if variants.is_empty() {
                return Err(Error::validation("stream.variants must not be empty"));
            }
            Ok(Operation::StreamMap(StreamMapParams { selectors: variants }))
        }
        other => Err(Error::validation(format!("unsupported operation kind: {other}"))),
    }
}

pub fn parse_options(options: &Value) -> Result<OutputOptions, Error> {
    let obj = options.as_object().cloned().unwrap_or_default();
    let container = obj.get("container").and_then(|v| v.as_str()).unwrap_or("mp4").to_string();
    Ok(OutputOptions {
        container,
        video_codec: obj.get("video_codec").and_then(|v| v.as_str()).map(str::to_string),
        audio_codec: obj.get("audio_codec").and_then(|v| v.as_str()).map(str::to_string),
        quality: obj.get("crf").and_then(|v| v.as_u64()).map(|v| v as u8),
        width: obj.get("width").and_then(|v| v.as_u64()).map(|v| v as u32),
        height: obj.get("height").and_then(|v| v.as_u64()).map(|v| v as u32),
        fps: obj.get("fps").and_then(|v| v.as_u64()).map(|v| v as u32),
        video_bitrate_kbps: u64_field(&Value::Object(obj.clone()), "video_bitrate").map(|v| v as u32),
        audio_bitrate_kbps: u64_field(&Value::Object(obj.clone()), "audio_bitrate").map(|v| v as u32),
    })
}
