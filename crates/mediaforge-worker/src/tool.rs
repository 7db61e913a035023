//! The external media tool as a trait, grounded on `FFmpegWrapper.probe_file`
//! / `execute_command`: one production implementation that shells out, one
//! scripted test double, per the "make each external dependency a
//! trait/interface" guidance.

use async_trait::async_trait;
use mediaforge_core::Error;
use std::path::Path;
use std::process::{Command, Stdio};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeInfo {
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub format_name: String,
    pub bit_rate: u64,
    pub size_bytes: u64,
    pub has_video_stream: bool,
}

#[async_trait]
pub trait MediaTool: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbeInfo, Error>;

    /// Runs `argv[0]` with `argv[1..]`, streaming stderr lines to `lines` as
    /// they arrive. Returns an error classified as `processing` (spec §7)
    /// built from the last 10 stderr lines if the process exits non-zero.
    async fn execute(&self, argv: &[String], lines: UnboundedSender<String>) -> Result<(), Error>;
}

/// Shells out to the real tool, dispatching the blocking child-process wait
/// through a `BlockingExecutor` (spec §4.H / §9: "wrap blocking media-tool
/// invocation with a bounded executor").
pub struct ProcessMediaTool {
    executor: mediaforge_executor::BlockingExecutor,
    ffmpeg_binary: String,
    ffprobe_binary: String,
}

impl ProcessMediaTool {
    pub fn new(executor: mediaforge_executor::BlockingExecutor) -> Self {
        Self {
            executor,
            ffmpeg_binary: "ffmpeg".to_string(),
            ffprobe_binary: "ffprobe".to_string(),
        }
    }
}

#[async_trait]
impl MediaTool for ProcessMediaTool {
    async fn probe(&self, path: &Path) -> Result<ProbeInfo, Error> {
        let binary = self.ffprobe_binary.clone();
        let path = path.to_path_buf();
        let join = self.executor.spawn_blocking(move || run_ffprobe(&binary, &path));
        join.await.map_err(|e| Error::internal(format!("probe task panicked: {e}")))?
    }

    async fn execute(&self, argv: &[String], lines: UnboundedSender<String>) -> Result<(), Error> {
        let argv = argv.to_vec();
        let join = self.executor.spawn_blocking(move || run_ffmpeg(&argv, lines));
        join.await.map_err(|e| Error::internal(format!("execute task panicked: {e}")))?
    }
}

fn run_ffprobe(binary: &str, path: &Path) -> Result<ProbeInfo, Error> {
    let output = Command::new(binary)
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()
        .map_err(|e| Error::processing(format!("failed to run probe: {e}")))?;

    if !output.status.success() {
        return Err(Error::processing("probe exited with a non-zero status"));
    }

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| Error::processing(format!("failed to parse probe output: {e}")))?;

    let format = json.get("format").cloned().unwrap_or_default();
    let streams = json.get("streams").and_then(|s| s.as_array()).cloned().unwrap_or_default();
    let video_stream = streams.iter().find(|s| s.get("codec_type").and_then(|v| v.as_str()) == Some("video"));

    Ok(ProbeInfo {
        duration_seconds: format.get("duration").and_then(|v| v.as_str()).and_then(|s| s.parse().ok()).unwrap_or(0.0),
        width: video_stream.and_then(|s| s.get("width")).and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        height: video_stream.and_then(|s| s.get("height")).and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        format_name: format.get("format_name").and_then(|v| v.as_str()).unwrap_or_default().to_string(),
        bit_rate: format.get("bit_rate").and_then(|v| v.as_str()).and_then(|s| s.parse().ok()).unwrap_or(0),
        size_bytes: format.get("size").and_then(|v| v.as_str()).and_then(|s| s.parse().ok()).unwrap_or(0),
        has_video_stream: video_stream.is_some(),
    })
}

fn run_ffmpeg(argv: &[String], lines: UnboundedSender<String>) -> Result<(), Error> {
    use std::io::{BufRead, BufReader};

    let mut child = Command::new(&argv[0])
        .args(&argv[1..])
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::processing(format!("failed to spawn media tool: {e}")))?;

    let stderr = child.stderr.take().expect("stderr was piped");
    let reader = BufReader::new(stderr);
    let mut tail: std::collections::VecDeque<String> = std::collections::VecDeque::with_capacity(10);

    for line in reader.lines().map_while(Result::ok) {
        if tail.len() == 10 {
            tail.pop_front();
        }
        tail.push_back(line.clone());
        let _ = lines.send(line);
    }

    let status = child.wait().map_err(|e| Error::processing(format!("failed waiting on media tool: {e}")))?;

    if status.success() {
        Ok(())
    } else {
        Err(Error::processing(tail.into_iter().collect::<Vec<_>>().join("\n")))
    }
}

/// A scripted tool for tests: returns fixed probe results and plays back a
/// canned sequence of stderr lines before resolving to a fixed outcome.
pub mod fake {
    use super::*;
    use std::sync::Mutex;

    pub struct ScriptedTool {
        probe_result: ProbeInfo,
        stderr_lines: Vec<String>,
        outcome: Result<(), String>,
        pub executed_argv: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedTool {
        pub fn new(probe_result: ProbeInfo, stderr_lines: Vec<String>, outcome: Result<(), String>) -> Self {
            Self { probe_result, stderr_lines, outcome, executed_argv: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl MediaTool for ScriptedTool {
        async fn probe(&self, _path: &Path) -> Result<ProbeInfo, Error> {
            Ok(self.probe_result.clone())
        }

        async fn execute(&self, argv: &[String], lines: UnboundedSender<String>) -> Result<(), Error> {
            self.executed_argv.lock().unwrap().push(argv.to_vec());
            for line in &self.stderr_lines {
                let _ = lines.send(line.clone());
            }
            self.outcome.clone().map_err(Error::processing)
        }
    }
}
