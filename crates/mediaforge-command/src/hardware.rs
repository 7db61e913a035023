//! Hardware-encoder discovery and selection, grounded on
//! `HardwareAcceleration.detect_capabilities` / `get_best_encoder`.
//!
//! Detection is a side-effecting probe (it shells out to the media tool to
//! list encoders); selection from an already-known capability set is pure.
//! Splitting them lets the builder stay synchronous and lets tests run
//! against a [`StaticProbe`] instead of the real tool.

use std::collections::HashSet;

/// Preference order mirrors the original: hardware vendors are tried before
/// falling back to the software encoder, in this fixed order.
const PREFERENCE: &[&str] = &["nvenc", "qsv", "vaapi", "videotoolbox", "amf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    H264,
    H265,
    Av1,
}

impl Codec {
    fn encoder_table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Codec::H264 => &[
                ("nvenc", "h264_nvenc"),
                ("qsv", "h264_qsv"),
                ("vaapi", "h264_vaapi"),
                ("videotoolbox", "h264_videotoolbox"),
                ("amf", "h264_amf"),
                ("software", "libx264"),
            ],
            Codec::H265 => &[
                ("nvenc", "hevc_nvenc"),
                ("qsv", "hevc_qsv"),
                ("vaapi", "hevc_vaapi"),
                ("videotoolbox", "hevc_videotoolbox"),
                ("amf", "hevc_amf"),
                ("software", "libx265"),
            ],
            Codec::Av1 => &[
                ("nvenc", "av1_nvenc"),
                ("qsv", "av1_qsv"),
                ("software", "libaom-av1"),
            ],
        }
    }
}

/// A single encoder entry as reported (or assumed) available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoder {
    pub name: String,
    pub vendor: &'static str,
}

/// The set of hardware vendors this host's build of the tool can use,
/// as discovered by a [`HardwareProbe`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HardwareCapabilities {
    available_encoders: HashSet<String>,
}

impl HardwareCapabilities {
    pub fn from_encoder_names(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            available_encoders: names.into_iter().collect(),
        }
    }

    pub fn has_encoder(&self, name: &str) -> bool {
        self.available_encoders.contains(name)
    }

    /// Picks the best available encoder for `codec`, walking the
    /// hardware-vendor preference order before falling back to software.
    /// Always returns an encoder: software is assumed present.
    pub fn best_encoder(&self, codec: Codec) -> Encoder {
        let table = codec.encoder_table();
        for vendor in PREFERENCE {
            if let Some((_, name)) = table.iter().find(|(v, _)| v == vendor) {
                if self.has_encoder(name) {
                    return Encoder { name: name.to_string(), vendor };
                }
            }
        }
        let (_, software) = table
            .iter()
            .find(|(v, _)| *v == "software")
            .expect("every codec table defines a software fallback");
        Encoder { name: software.to_string(), vendor: "software" }
    }
}

/// Discovers what the locally installed tool build supports. Implemented
/// either by shelling out ([`FfmpegProbe`], `probe` feature) or by a fixed
/// test double ([`StaticProbe`]).
pub trait HardwareProbe: Send + Sync {
    fn detect(&self) -> HardwareCapabilities;
}

/// A probe that always reports a fixed capability set, for tests and for
/// hosts where hardware acceleration is deliberately disabled.
pub struct StaticProbe(HardwareCapabilities);

impl StaticProbe {
    pub fn new(capabilities: HardwareCapabilities) -> Self {
        Self(capabilities)
    }

    /// No hardware encoders at all; every codec resolves to its software
    /// fallback.
    pub fn software_only() -> Self {
        Self(HardwareCapabilities::default())
    }
}

impl HardwareProbe for StaticProbe {
    fn detect(&self) -> HardwareCapabilities {
        self.0.clone()
    }
}

#[cfg(feature = "probe")]
pub use live::FfmpegProbe;

#[cfg(feature = "probe")]
mod live {
    use super::*;
    use std::process::Command;

    /// Shells out to `ffmpeg -encoders` and parses the encoder names out of
    /// its listing. Run once at worker startup; the result is meant to be
    /// cached, not re-probed per job.
    pub struct FfmpegProbe {
        binary: String,
    }

    impl FfmpegProbe {
        pub fn new(binary: impl Into<String>) -> Self {
            Self { binary: binary.into() }
        }
    }

    impl Default for FfmpegProbe {
        fn default() -> Self {
            Self::new("ffmpeg")
        }
    }

    impl HardwareProbe for FfmpegProbe {
        fn detect(&self) -> HardwareCapabilities {
            let output = Command::new(&self.binary).arg("-encoders").output();
            let names = match output {
                Ok(out) if out.status.success() => parse_encoder_listing(&String::from_utf8_lossy(&out.stdout)),
                _ => HashSet::new(),
            };
            HardwareCapabilities::from_encoder_names(names)
        }
    }

    fn parse_encoder_listing(listing: &str) -> HashSet<String> {
        listing
            .lines()
            .filter_map(|line| {
                let trimmed = line.trim_start();
                // Encoder lines look like " V..... libx264  ...". The
                // second whitespace-delimited token is the encoder name.
                if trimmed.len() < 8 || !trimmed.starts_with(['V', 'A', 'S']) {
                    return None;
                }
                trimmed.split_whitespace().nth(1).map(str::to_string)
            })
            .collect()
    }
}
