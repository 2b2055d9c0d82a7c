//! # catchup-engine
//!
//! Stream resolution and download supervision for the `catchup` CLI.
//!
//! The engine takes catalog episodes, picks the best HLS variant, runs an
//! external transcoder (ffmpeg or avconv) to pull the stream into a local
//! file and turns its status output into structured progress.
//!
//! - [`manifest`]: master playlist parsing, ranking and URL resolution
//! - [`progress`]: transcoder status line parsing and progress derivation
//! - [`supervisor`]: the per-episode state machine
//! - [`catalog`]: series document traversal
//! - [`toolchain`]: probe, transcoder and subtitle converter processes

pub mod catalog;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod manifest;
pub mod model;
pub mod progress;
pub mod prompt;
pub mod subtitles;
pub mod supervisor;
pub mod toolchain;

#[cfg(test)]
pub(crate) mod test_utils;

pub use catalog::{CatalogSource, HttpCatalog};
pub use config::{NamingMode, RunConfiguration, Traversal, VariantSelection};
pub use error::{EngineError, Result};
pub use events::{EventReceiver, EventSender, SupervisorEvent};
pub use manifest::{HttpPlaylistFetcher, PlaylistFetcher};
pub use model::{AttemptOutcome, DownloadTarget, EpisodeRecord, MediaKind, StreamVariant, SubtitleTrack};
pub use progress::{ProgressSample, TranscoderKind};
pub use prompt::Prompter;
pub use supervisor::DownloadSupervisor;
pub use toolchain::{MediaToolchain, ProcessToolchain};
