use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Kind of media an episode carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Video,
    /// Radio content, re-encoded to AAC.
    Audio,
}

impl MediaKind {
    /// Container extension used for the output file.
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "m4a",
        }
    }

    /// Transcoder arguments placed between the input and the output.
    pub fn transcoder_params(self) -> &'static [&'static str] {
        match self {
            MediaKind::Video => &["-c", "copy", "-bsf:a", "aac_adtstoasc"],
            MediaKind::Audio => &["-vn", "-c:a", "aac", "-b:a", "128k"],
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// One quality rendition listed in a master playlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamVariant {
    /// Declared bitrate in bits per second.
    pub bandwidth: u64,
    /// `(width, height)`, absent for audio-only renditions.
    pub resolution: Option<(u64, u64)>,
    pub uri: String,
}

impl StreamVariant {
    /// Resolution as `WxH`, or `audio` when the variant has none.
    pub fn resolution_label(&self) -> String {
        match self.resolution {
            Some((width, height)) => format!("{width}x{height}"),
            None => "audio".to_string(),
        }
    }

    pub fn kbps(&self) -> u64 {
        self.bandwidth / 1000
    }
}

impl fmt::Display for StreamVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>9}  {:>6} Kbit/s", self.resolution_label(), self.kbps())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub url: String,
    pub lang: String,
}

/// A single episode as listed by a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    pub display_title: String,
    pub series_title: String,
    pub source_url: String,
    pub media_kind: MediaKind,
    pub season: Option<u32>,
    /// Episode number or air date, as published.
    pub episode_label: Option<String>,
    /// Publisher-supplied reason used when the stream cannot be probed.
    pub unavailable_reason: Option<String>,
    pub subtitles: Option<SubtitleTrack>,
}

/// Everything the supervisor needs to acquire one episode.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadTarget {
    pub source_url: String,
    pub destination: PathBuf,
    pub media_kind: MediaKind,
    pub unavailable_reason: Option<String>,
    pub subtitles: Option<SubtitleTrack>,
}

impl DownloadTarget {
    pub fn new(source_url: impl Into<String>, destination: impl Into<PathBuf>, media_kind: MediaKind) -> Self {
        Self {
            source_url: source_url.into(),
            destination: destination.into(),
            media_kind,
            unavailable_reason: None,
            subtitles: None,
        }
    }

    pub fn with_unavailable_reason(mut self, reason: Option<String>) -> Self {
        self.unavailable_reason = reason;
        self
    }

    pub fn with_subtitles(mut self, subtitles: Option<SubtitleTrack>) -> Self {
        self.subtitles = subtitles;
        self
    }

    /// Path the transcoder writes to until the attempt completes.
    ///
    /// The container extension is kept last so the transcoder can still
    /// infer the output format from it.
    pub fn partial_path(&self) -> PathBuf {
        let stem = self
            .destination
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "download".to_string());
        let name = match self.destination.extension() {
            Some(ext) => format!("{stem}.part.{}", ext.to_string_lossy()),
            None => format!("{stem}.part"),
        };
        self.destination.with_file_name(name)
    }
}

/// Terminal result of one acquisition attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// The destination existed and was kept.
    Skipped,
    /// Dry-run: the stream is playable.
    Available { total_seconds: u64 },
    Unavailable { reason: String },
    Failed { reason: String },
    Completed { size_bytes: u64, wall_clock: Duration },
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            AttemptOutcome::Completed { .. } | AttemptOutcome::Available { .. }
        )
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptOutcome::Skipped => write!(f, "skipped"),
            AttemptOutcome::Available { total_seconds } => {
                write!(f, "available ({total_seconds}s)")
            }
            AttemptOutcome::Unavailable { reason } => write!(f, "unavailable: {reason}"),
            AttemptOutcome::Failed { reason } => write!(f, "failed: {reason}"),
            AttemptOutcome::Completed {
                size_bytes,
                wall_clock,
            } => write!(f, "completed ({size_bytes} bytes in {wall_clock:?})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path_keeps_container_extension() {
        let target = DownloadTarget::new("http://x/a.m3u8", "/tmp/show/Ep 1.mp4", MediaKind::Video);
        assert_eq!(target.partial_path(), PathBuf::from("/tmp/show/Ep 1.part.mp4"));
    }

    #[test]
    fn test_variant_labels() {
        let video = StreamVariant {
            bandwidth: 1_200_000,
            resolution: Some((1280, 720)),
            uri: "high.m3u8".to_string(),
        };
        let radio = StreamVariant {
            bandwidth: 96_000,
            resolution: None,
            uri: "audio.m3u8".to_string(),
        };
        assert_eq!(video.resolution_label(), "1280x720");
        assert_eq!(video.kbps(), 1200);
        assert_eq!(radio.resolution_label(), "audio");
    }

    #[test]
    fn test_media_kind_params() {
        assert!(MediaKind::Video.transcoder_params().contains(&"aac_adtstoasc"));
        assert!(MediaKind::Audio.transcoder_params().contains(&"-vn"));
        assert_eq!(MediaKind::Audio.extension(), "m4a");
    }

    #[test]
    fn test_success_outcomes() {
        assert!(AttemptOutcome::Available { total_seconds: 1 }.is_success());
        assert!(!AttemptOutcome::Skipped.is_success());
        assert!(
            !AttemptOutcome::Failed {
                reason: "x".to_string()
            }
            .is_success()
        );
    }
}
