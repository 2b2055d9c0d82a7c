//! Transcoder status line parsing and progress derivation.
//!
//! [`parse_line`] only extracts what a line says; [`ProgressSample`] turns
//! the extracted values into percent, ETA and throughput.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Marker line reporting that the transcoder exited unsuccessfully.
pub const EXIT_SENTINEL_PREFIX: &str = "catchup: transcoder exited with status";

static SENTINEL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"catchup: transcoder exited with status (-?\d+)").unwrap()
});

static TIME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"time=\s*(\S+)").unwrap());

static BITRATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"bitrate=\s*([\d.]+)\s*kbits/s").unwrap());

static SPEED_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"speed=\s*([\d.]+)x").unwrap());

/// Transcoder family, which decides the `time=` format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscoderKind {
    /// `time=HH:MM:SS.ff`
    Ffmpeg,
    /// `time=<seconds>`
    Avconv,
}

impl TranscoderKind {
    pub fn transcoder_binary(self) -> &'static str {
        match self {
            TranscoderKind::Ffmpeg => "ffmpeg",
            TranscoderKind::Avconv => "avconv",
        }
    }

    pub fn probe_binary(self) -> &'static str {
        match self {
            TranscoderKind::Ffmpeg => "ffprobe",
            TranscoderKind::Avconv => "avprobe",
        }
    }
}

/// Values found on one progress line. Missing or `N/A` values are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressFields {
    pub elapsed_seconds: Option<u64>,
    pub bitrate_kbps: Option<f64>,
    pub speed: Option<f64>,
}

/// Classification of one transcoder output line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineEvent {
    Progress(ProgressFields),
    /// The sentinel: the process ended with a nonzero status.
    Failed { code: i32 },
    /// A log or warning line, shown to the operator but not fatal.
    Diagnostic(String),
    Ignore,
}

/// Classifies a single logical line of transcoder output.
pub fn parse_line(line: &str, kind: TranscoderKind) -> LineEvent {
    let line = line.trim();
    if line.is_empty() {
        return LineEvent::Ignore;
    }

    if let Some(caps) = SENTINEL_REGEX.captures(line) {
        let code = caps[1].parse().unwrap_or(-1);
        return LineEvent::Failed { code };
    }

    if !line.contains("bitrate=") && !line.contains("speed=") {
        return LineEvent::Diagnostic(line.to_string());
    }

    let elapsed_seconds = TIME_REGEX
        .captures(line)
        .and_then(|caps| parse_timestamp(&caps[1], kind));
    let bitrate_kbps = BITRATE_REGEX
        .captures(line)
        .and_then(|caps| caps[1].parse().ok());
    let speed = SPEED_REGEX.captures(line).and_then(|caps| caps[1].parse().ok());

    LineEvent::Progress(ProgressFields {
        elapsed_seconds,
        bitrate_kbps,
        speed,
    })
}

/// Converts a `time=` value to whole seconds.
pub fn parse_timestamp(value: &str, kind: TranscoderKind) -> Option<u64> {
    match kind {
        TranscoderKind::Ffmpeg => {
            let mut parts = value.splitn(3, ':');
            let hours: u64 = parts.next()?.parse().ok()?;
            let minutes: u64 = parts.next()?.parse().ok()?;
            let seconds: f64 = parts.next()?.parse().ok()?;
            if !seconds.is_finite() || seconds < 0.0 {
                return None;
            }
            hours
                .checked_mul(3600)?
                .checked_add(minutes.checked_mul(60)?)?
                .checked_add(seconds.trunc() as u64)
        }
        TranscoderKind::Avconv => {
            let seconds: f64 = value.parse().ok()?;
            (seconds.is_finite() && seconds >= 0.0).then(|| seconds.trunc() as u64)
        }
    }
}

/// Formats seconds as `HH:MM:SS`.
pub fn format_hms(seconds: u64) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// Running state of one download attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressSample {
    pub elapsed_seconds: u64,
    pub total_seconds: u64,
    pub bitrate_kbps: f64,
    pub speed: f64,
}

impl ProgressSample {
    pub fn new(total_seconds: u64) -> Self {
        Self {
            total_seconds,
            ..Default::default()
        }
    }

    /// Folds a parsed line into the sample. Absent values keep their
    /// previous value.
    pub fn apply(&mut self, fields: &ProgressFields) {
        if let Some(elapsed) = fields.elapsed_seconds {
            self.elapsed_seconds = elapsed;
        }
        if let Some(bitrate) = fields.bitrate_kbps {
            self.bitrate_kbps = bitrate;
        }
        if let Some(speed) = fields.speed {
            self.speed = speed;
        }
    }

    /// Marks the sample as fully transcoded.
    pub fn finish(&mut self) {
        self.elapsed_seconds = self.total_seconds;
    }

    /// `elapsed * 100 / total` in integer arithmetic, clamped to 100.
    pub fn percent_complete(&self) -> u64 {
        if self.total_seconds == 0 {
            return 0;
        }
        (self.elapsed_seconds * 100 / self.total_seconds).min(100)
    }

    /// Seconds left at the current speed, `None` when unknown.
    pub fn eta_seconds(&self) -> Option<f64> {
        let remaining = self.total_seconds.saturating_sub(self.elapsed_seconds) as f64;
        let eta = remaining / self.speed;
        eta.is_finite().then_some(eta)
    }

    /// Effective download rate in Mbit/s.
    pub fn download_speed_mbps(&self) -> f64 {
        self.bitrate_kbps * self.speed / 1024.0
    }
}

impl fmt::Display for ProgressSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eta = self
            .eta_seconds()
            .map(|eta| format_hms(eta.round() as u64))
            .unwrap_or_else(|| "--:--:--".to_string());
        write!(
            f,
            "{} / {} {:>3}% {:>6.2} Mbit/s ETA {}",
            format_hms(self.elapsed_seconds),
            format_hms(self.total_seconds),
            self.percent_complete(),
            self.download_speed_mbps(),
            eta
        )
    }
}
