use catchup_engine::events;
use catchup_engine::{
    AttemptOutcome, CatalogSource, DownloadSupervisor, DownloadTarget, EngineError, EpisodeRecord,
    SupervisorEvent,
};
use tracing::{error, info, warn};

use crate::error::AppError;
use crate::utils::destination_path;

/// Tally of episode outcomes over a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: usize,
    pub available: usize,
    pub skipped: usize,
    pub unavailable: usize,
    pub failed: usize,
    /// Catalog URLs that could not be listed.
    pub catalog_errors: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: &AttemptOutcome) {
        match outcome {
            AttemptOutcome::Completed { .. } => self.completed += 1,
            AttemptOutcome::Available { .. } => self.available += 1,
            AttemptOutcome::Skipped => self.skipped += 1,
            AttemptOutcome::Unavailable { .. } => self.unavailable += 1,
            AttemptOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.completed + self.available + self.skipped + self.unavailable + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.catalog_errors > 0
    }
}

/// Walks every catalog URL and acquires its episodes one after another.
///
/// A catalog that cannot be listed is logged and counted; per-episode
/// problems become outcomes. Only a failed prompt stops the run.
pub async fn process_inputs(
    urls: &[String],
    catalog: &dyn CatalogSource,
    supervisor: &DownloadSupervisor,
) -> Result<RunSummary, AppError> {
    if urls.is_empty() {
        return Err(AppError::InvalidInput("No catalog URLs provided".to_string()));
    }

    let traversal = supervisor.config().traversal;
    info!(
        inputs_count = urls.len(),
        ?traversal,
        "Starting processing of {} catalog{}",
        urls.len(),
        if urls.len() == 1 { "" } else { "s" }
    );

    let mut summary = RunSummary::default();
    for url in urls {
        let records = match catalog.episodes(url, traversal).await {
            Ok(records) => records,
            Err(e) => {
                error!(url = %url, "Could not list catalog: {e}");
                summary.catalog_errors += 1;
                continue;
            }
        };
        if records.is_empty() {
            warn!(url = %url, "Catalog lists no episodes");
        }

        for record in &records {
            let outcome = process_episode(record, supervisor).await?;
            summary.record(&outcome);
            let _ = supervisor.events().send(SupervisorEvent::Outcome {
                title: record.display_title.clone(),
                outcome,
            });
            // Keep the next prompt from interleaving with this episode's output.
            events::flush(supervisor.events()).await;
        }
    }

    info!(?summary, "Processing finished");
    Ok(summary)
}

async fn process_episode(
    record: &EpisodeRecord,
    supervisor: &DownloadSupervisor,
) -> Result<AttemptOutcome, AppError> {
    let destination = destination_path(supervisor.config(), record);
    let target = DownloadTarget::new(&record.source_url, destination, record.media_kind)
        .with_unavailable_reason(record.unavailable_reason.clone())
        .with_subtitles(record.subtitles.clone());

    match supervisor.acquire(&record.display_title, &target).await {
        Ok(outcome) => Ok(outcome),
        Err(e @ EngineError::Prompt(_)) => Err(e.into()),
        Err(e) => {
            error!(title = %record.display_title, "Episode failed: {e}");
            Ok(AttemptOutcome::Failed {
                reason: e.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use catchup_engine::{
        HttpPlaylistFetcher, MediaKind, ProcessToolchain, Prompter, RunConfiguration,
        TranscoderKind, Traversal,
    };

    struct StaticCatalog {
        records: Vec<EpisodeRecord>,
    }

    #[async_trait]
    impl CatalogSource for StaticCatalog {
        async fn episodes(
            &self,
            catalog_url: &str,
            _traversal: Traversal,
        ) -> catchup_engine::Result<Vec<EpisodeRecord>> {
            if catalog_url.contains("broken") {
                return Err(EngineError::Catalog("bad document".to_string()));
            }
            Ok(self.records.clone())
        }
    }

    struct SilentPrompter;

    impl Prompter for SilentPrompter {
        fn show(&self, _line: &str) {}

        fn ask(&self, _question: &str) -> catchup_engine::Result<String> {
            Err(EngineError::Prompt("no terminal".to_string()))
        }
    }

    fn record(title: &str, source_url: &str, reason: Option<&str>) -> EpisodeRecord {
        EpisodeRecord {
            display_title: title.to_string(),
            series_title: "Night Shift".to_string(),
            source_url: source_url.to_string(),
            media_kind: MediaKind::Video,
            season: Some(1),
            episode_label: None,
            unavailable_reason: reason.map(str::to_string),
            subtitles: None,
        }
    }

    fn supervisor(config: RunConfiguration) -> DownloadSupervisor {
        let client = config.http_client().unwrap();
        // Dropping the receiver turns event sends and flushes into no-ops.
        let (tx, _) = events::channel();
        DownloadSupervisor::new(
            Arc::new(config),
            Arc::new(ProcessToolchain::new(TranscoderKind::Ffmpeg, Vec::new())),
            Arc::new(HttpPlaylistFetcher::new(client.clone())),
            Arc::new(SilentPrompter),
            client,
            tx,
        )
    }

    #[tokio::test]
    async fn test_outcomes_are_tallied_across_catalogs() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfiguration::builder()
            .target_dir(dir.path())
            .no_confirm(true)
            .build();

        let existing = destination_path(&config, &record("Pilot", "http://x/a.mp4", None));
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, b"old").unwrap();

        let catalog = StaticCatalog {
            records: vec![
                record("Pilot", "http://x/a.mp4", None),
                record("Second", "", Some("expired")),
            ],
        };
        let urls = vec!["http://x/series".to_string(), "http://x/broken".to_string()];

        let summary = process_inputs(&urls, &catalog, &supervisor(config)).await.unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.unavailable, 1);
        assert_eq!(summary.catalog_errors, 1);
        assert_eq!(summary.total(), 2);
        assert!(summary.has_failures());
        assert_eq!(std::fs::read(&existing).unwrap(), b"old");
    }

    #[tokio::test]
    async fn test_prompt_failure_stops_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = RunConfiguration::builder().target_dir(dir.path()).build();

        let existing = destination_path(&config, &record("Pilot", "http://x/a.mp4", None));
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, b"old").unwrap();

        let catalog = StaticCatalog {
            records: vec![record("Pilot", "http://x/a.mp4", None)],
        };
        let result = process_inputs(&["http://x/series".to_string()], &catalog, &supervisor(config)).await;

        assert!(matches!(result, Err(AppError::Engine(EngineError::Prompt(_)))));
    }

    #[tokio::test]
    async fn test_no_urls() {
        let config = RunConfiguration::default();
        let catalog = StaticCatalog { records: Vec::new() };
        assert!(matches!(
            process_inputs(&[], &catalog, &supervisor(config)).await,
            Err(AppError::InvalidInput(_))
        ));
    }
}
