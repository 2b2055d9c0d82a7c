use std::path::PathBuf;

use reqwest::StatusCode;

/// Errors raised by the engine.
///
/// Per-episode conditions such as an unavailable stream or a failed
/// transcode are not errors; they are reported as an
/// [`AttemptOutcome`](crate::AttemptOutcome).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("required tool not found: {0}")]
    DependencyMissing(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status code {status} for {url}")]
    Status { status: StatusCode, url: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error on {path}: {source}")]
    PathIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("playlist error: {0}")]
    Playlist(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("subtitle conversion failed: {0}")]
    Subtitles(String),
}

impl EngineError {
    pub(crate) fn path_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EngineError::PathIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
