//! External executables: probe, transcoder and subtitle converter.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, future};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, warn};

use crate::codec::StatusLineCodec;
use crate::progress::{EXIT_SENTINEL_PREFIX, TranscoderKind};
use crate::{EngineError, Result};

/// Lines produced by a running transcoder, in emission order.
///
/// When the process exits unsuccessfully the stream ends with a sentinel
/// line built from the real exit status.
pub type TranscoderOutput = BoxStream<'static, String>;

#[async_trait]
pub trait MediaToolchain: Send + Sync {
    fn kind(&self) -> TranscoderKind;

    /// Media duration in seconds, `None` when the stream cannot be played.
    async fn probe_duration(&self, url: &str) -> Result<Option<f64>>;

    /// Starts `-i <url> <params> -y <output>` and streams its status output.
    async fn transcode(&self, url: &str, params: &[&str], output: &Path) -> Result<TranscoderOutput>;

    /// Feeds caption markup to the converter and returns SubRip text.
    async fn convert_subtitles(&self, markup: &str) -> Result<String>;
}

/// [`MediaToolchain`] backed by real processes.
#[derive(Debug, Clone)]
pub struct ProcessToolchain {
    kind: TranscoderKind,
    transcoder: String,
    probe: String,
    converter: Vec<String>,
}

impl ProcessToolchain {
    /// Uses the standard binary names for `kind`, looked up on `PATH`.
    pub fn new(kind: TranscoderKind, converter: Vec<String>) -> Self {
        Self::with_binaries(kind, kind.transcoder_binary(), kind.probe_binary(), converter)
    }

    /// Uses explicit transcoder and probe executables of the given family.
    pub fn with_binaries(
        kind: TranscoderKind,
        transcoder: impl Into<String>,
        probe: impl Into<String>,
        converter: Vec<String>,
    ) -> Self {
        Self {
            kind,
            transcoder: transcoder.into(),
            probe: probe.into(),
            converter,
        }
    }

    /// Finds a usable transcoder/probe pair, preferring ffmpeg over avconv.
    ///
    /// An empty `converter` selects the transcoder itself as the subtitle
    /// converter (WebVTT in, SubRip out).
    pub async fn discover(converter: Vec<String>) -> Result<Self> {
        for kind in [TranscoderKind::Ffmpeg, TranscoderKind::Avconv] {
            if tool_responds(kind.transcoder_binary()).await && tool_responds(kind.probe_binary()).await {
                info!(
                    transcoder = kind.transcoder_binary(),
                    probe = kind.probe_binary(),
                    "Found media tools"
                );
                let converter = if converter.is_empty() {
                    default_converter(kind)
                } else {
                    converter
                };
                return Ok(Self::new(kind, converter));
            }
        }
        Err(EngineError::DependencyMissing(
            "ffmpeg and ffprobe (or avconv and avprobe) must be on PATH".to_string(),
        ))
    }
}

fn default_converter(kind: TranscoderKind) -> Vec<String> {
    [kind.transcoder_binary(), "-loglevel", "error", "-i", "pipe:0", "-f", "srt", "pipe:1"]
        .into_iter()
        .map(String::from)
        .collect()
}

async fn tool_responds(binary: &str) -> bool {
    let status = Command::new(binary)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match status {
        Ok(status) => status.success(),
        Err(e) => {
            debug!("{binary} not usable: {e}");
            false
        }
    }
}

/// Probe options that print the container duration as `duration=<seconds>`.
///
/// avprobe has no `-show_entries`.
fn probe_args(kind: TranscoderKind) -> &'static [&'static str] {
    match kind {
        TranscoderKind::Ffmpeg => &[
            "-v",
            "quiet",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1",
        ],
        TranscoderKind::Avconv => &["-v", "quiet", "-show_format_entry", "duration"],
    }
}

/// Options placed before `-i` to keep the status output to progress and errors.
fn transcoder_args(kind: TranscoderKind) -> &'static [&'static str] {
    match kind {
        TranscoderKind::Ffmpeg => &["-hide_banner"],
        TranscoderKind::Avconv => &[],
    }
}

/// Extracts `duration=<seconds>` from probe output.
pub fn parse_probe_duration(output: &str) -> Option<f64> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("duration="))
        .find_map(|value| value.trim().parse::<f64>().ok())
        .filter(|seconds| seconds.is_finite() && *seconds > 0.0)
}

#[async_trait]
impl MediaToolchain for ProcessToolchain {
    fn kind(&self) -> TranscoderKind {
        self.kind
    }

    async fn probe_duration(&self, url: &str) -> Result<Option<f64>> {
        let output = Command::new(&self.probe)
            .args(probe_args(self.kind))
            .arg(url)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            debug!(status = ?output.status, "Probe rejected {url}");
            return Ok(None);
        }
        Ok(parse_probe_duration(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn transcode(&self, url: &str, params: &[&str], output: &Path) -> Result<TranscoderOutput> {
        let mut command = Command::new(&self.transcoder);
        command
            .args(transcoder_args(self.kind))
            .arg("-i")
            .arg(url)
            .args(params)
            .arg("-y")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        debug!(?command, "Spawning transcoder");

        let mut child = command.spawn()?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::Io(std::io::Error::other("transcoder stderr not captured")))?;

        let lines = FramedRead::new(stderr, StatusLineCodec::new()).filter_map(|line| async move {
            match line {
                Ok(line) => Some(line),
                Err(e) => {
                    warn!("Failed to read transcoder output: {e}");
                    None
                }
            }
        });

        let exit = stream::once(async move {
            match child.wait().await {
                Ok(status) if status.success() => None,
                Ok(status) => Some(format!("{EXIT_SENTINEL_PREFIX} {}", status.code().unwrap_or(-1))),
                Err(e) => {
                    warn!("Failed to wait for transcoder: {e}");
                    Some(format!("{EXIT_SENTINEL_PREFIX} -1"))
                }
            }
        })
        .filter_map(future::ready);

        Ok(lines.chain(exit).boxed())
    }

    async fn convert_subtitles(&self, markup: &str) -> Result<String> {
        let (program, args) = self
            .converter
            .split_first()
            .ok_or_else(|| EngineError::Subtitles("no converter configured".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Subtitles("converter stdin not captured".to_string()))?;
        let markup = markup.to_owned();
        let writer = tokio::spawn(async move {
            stdin.write_all(markup.as_bytes()).await?;
            stdin.shutdown().await
        });

        let output = child.wait_with_output().await?;
        if let Ok(Err(e)) = writer.await {
            warn!("Converter closed its input early: {e}");
        }

        if !output.status.success() {
            return Err(EngineError::Subtitles(format!(
                "{program} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
