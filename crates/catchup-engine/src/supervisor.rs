//! Per-episode acquisition.
//!
//! One [`DownloadSupervisor::acquire`] call walks an episode through
//! existence check, manifest resolution, probing and transcoding, and
//! reports exactly one [`AttemptOutcome`]. Progress goes to the event
//! channel; nothing here draws to the terminal.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::RunConfiguration;
use crate::events::{EventSender, SupervisorEvent};
use crate::manifest::{self, PlaylistFetcher, is_master_playlist_url, rewrite_legacy_url};
use crate::model::{AttemptOutcome, DownloadTarget};
use crate::progress::{LineEvent, ProgressSample, parse_line};
use crate::prompt::{Prompter, confirm_overwrite};
use crate::subtitles::fetch_sidecar;
use crate::toolchain::MediaToolchain;
use crate::{EngineError, Result};

const DEFAULT_UNAVAILABLE_REASON: &str = "stream not available";

pub struct DownloadSupervisor {
    config: Arc<RunConfiguration>,
    toolchain: Arc<dyn MediaToolchain>,
    fetcher: Arc<dyn PlaylistFetcher>,
    prompter: Arc<dyn Prompter>,
    client: Client,
    events: EventSender,
}

impl DownloadSupervisor {
    pub fn new(
        config: Arc<RunConfiguration>,
        toolchain: Arc<dyn MediaToolchain>,
        fetcher: Arc<dyn PlaylistFetcher>,
        prompter: Arc<dyn Prompter>,
        client: Client,
        events: EventSender,
    ) -> Self {
        Self {
            config,
            toolchain,
            fetcher,
            prompter,
            client,
            events,
        }
    }

    pub fn config(&self) -> &RunConfiguration {
        &self.config
    }

    pub fn events(&self) -> &EventSender {
        &self.events
    }

    fn emit(&self, event: SupervisorEvent) {
        // A closed channel only means nobody is drawing.
        let _ = self.events.send(event);
    }

    /// Acquires one episode.
    ///
    /// Only I/O problems around the destination and prompt failures are
    /// errors; everything else ends in an outcome.
    pub async fn acquire(&self, title: &str, target: &DownloadTarget) -> Result<AttemptOutcome> {
        info!(title, url = %target.source_url, "Acquiring episode");

        if !self.config.dry_run && !self.check_existing(&target.destination).await? {
            self.fetch_subtitles(target).await;
            return Ok(AttemptOutcome::Skipped);
        }

        let media_url = self.resolve_media_url(&target.source_url).await?;
        if media_url.is_empty() {
            return Ok(self.unavailable(target));
        }

        let Some(duration) = self.toolchain.probe_duration(&media_url).await? else {
            return Ok(self.unavailable(target));
        };
        let total_seconds = (duration as u64).max(1);
        debug!(total_seconds, "Probe succeeded");

        if self.config.dry_run {
            return Ok(AttemptOutcome::Available { total_seconds });
        }

        let outcome = self.transcode(title, target, &media_url, total_seconds).await?;
        if matches!(outcome, AttemptOutcome::Completed { .. }) {
            self.fetch_subtitles(target).await;
        }
        Ok(outcome)
    }

    /// Returns `true` when the attempt may proceed.
    async fn check_existing(&self, destination: &Path) -> Result<bool> {
        let exists = tokio::fs::try_exists(destination)
            .await
            .map_err(|e| EngineError::path_io(destination, e))?;
        if !exists {
            return Ok(true);
        }

        if self.config.no_confirm {
            info!(path = %destination.display(), "File exists, skipping");
            return Ok(false);
        }

        if !confirm_overwrite(self.prompter.as_ref(), destination)? {
            info!(path = %destination.display(), "Keeping existing file");
            return Ok(false);
        }

        tokio::fs::remove_file(destination)
            .await
            .map_err(|e| EngineError::path_io(destination, e))?;
        debug!(path = %destination.display(), "Removed existing file");
        Ok(true)
    }

    /// Turns the catalog URL into a direct media URL. Empty means unavailable.
    async fn resolve_media_url(&self, source_url: &str) -> Result<String> {
        let url = rewrite_legacy_url(source_url);
        if !is_master_playlist_url(&url) {
            return Ok(url);
        }

        let master_text = match self.fetcher.fetch(&url).await {
            Ok(text) => text,
            Err(e) => {
                warn!(url = %url, "Could not fetch master playlist: {e}");
                return Ok(String::new());
            }
        };

        match manifest::resolve(
            &master_text,
            &url,
            self.config.variant_selection,
            self.prompter.as_ref(),
        ) {
            Ok(resolved) => Ok(resolved),
            Err(EngineError::Prompt(e)) => Err(EngineError::Prompt(e)),
            Err(e) => {
                warn!(url = %url, "Could not resolve variant: {e}");
                Ok(String::new())
            }
        }
    }

    fn unavailable(&self, target: &DownloadTarget) -> AttemptOutcome {
        let reason = target
            .unavailable_reason
            .clone()
            .unwrap_or_else(|| DEFAULT_UNAVAILABLE_REASON.to_string());
        warn!(url = %target.source_url, %reason, "Stream unavailable");
        AttemptOutcome::Unavailable { reason }
    }

    async fn transcode(
        &self,
        title: &str,
        target: &DownloadTarget,
        media_url: &str,
        total_seconds: u64,
    ) -> Result<AttemptOutcome> {
        let partial = target.partial_path();
        if let Some(parent) = partial.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| EngineError::path_io(parent, e))?;
        }
        discard(&partial).await;

        self.emit(SupervisorEvent::Started {
            title: title.to_string(),
            destination: target.destination.clone(),
            total_seconds,
        });

        let kind = self.toolchain.kind();
        let started = Instant::now();
        let mut lines = match self
            .toolchain
            .transcode(media_url, target.media_kind.transcoder_params(), &partial)
            .await
        {
            Ok(lines) => lines,
            Err(e) => {
                discard(&partial).await;
                let reason = format!("could not start transcoder: {e}");
                self.emit(SupervisorEvent::Aborted {
                    reason: reason.clone(),
                });
                return Ok(AttemptOutcome::Failed { reason });
            }
        };

        let mut sample = ProgressSample::new(total_seconds);
        let mut exit_code = None;
        while let Some(line) = lines.next().await {
            match parse_line(&line, kind) {
                LineEvent::Progress(fields) => {
                    sample.apply(&fields);
                    self.emit(SupervisorEvent::Progress(sample));
                }
                LineEvent::Failed { code } => {
                    exit_code = Some(code);
                }
                LineEvent::Diagnostic(text) => {
                    debug!(target: "transcoder", "{text}");
                    self.emit(SupervisorEvent::Diagnostic(text));
                }
                LineEvent::Ignore => {}
            }
        }
        drop(lines);
        let wall_clock = started.elapsed();

        if let Some(code) = exit_code {
            discard(&partial).await;
            let reason = format!("transcoder exited with status {code}");
            self.emit(SupervisorEvent::Aborted {
                reason: reason.clone(),
            });
            return Ok(AttemptOutcome::Failed { reason });
        }

        if let Err(e) = tokio::fs::rename(&partial, &target.destination).await {
            discard(&partial).await;
            let reason = format!("no output written: {e}");
            self.emit(SupervisorEvent::Aborted {
                reason: reason.clone(),
            });
            return Ok(AttemptOutcome::Failed { reason });
        }

        let size_bytes = tokio::fs::metadata(&target.destination)
            .await
            .map_err(|e| EngineError::path_io(&target.destination, e))?
            .len();

        sample.finish();
        self.emit(SupervisorEvent::Finished {
            sample,
            size_bytes,
            wall_clock,
        });
        info!(
            path = %target.destination.display(),
            size_bytes,
            elapsed = ?wall_clock,
            "Download complete"
        );

        Ok(AttemptOutcome::Completed {
            size_bytes,
            wall_clock,
        })
    }

    async fn fetch_subtitles(&self, target: &DownloadTarget) {
        if !self.config.subtitles {
            return;
        }
        let Some(track) = &target.subtitles else {
            return;
        };
        match fetch_sidecar(&self.client, self.toolchain.as_ref(), track, &target.destination).await {
            Ok(Some(path)) => self.emit(SupervisorEvent::Diagnostic(format!(
                "Subtitles saved to {}",
                path.display()
            ))),
            Ok(None) => {}
            Err(e) => warn!(url = %track.url, "Subtitle download failed: {e}"),
        }
    }
}

/// Removes a partial file, ignoring a missing one.
async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Could not remove partial output: {e}"),
    }
}
