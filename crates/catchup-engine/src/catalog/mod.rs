//! Catalog traversal: turns a series URL into the ordered episode list.

pub mod models;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Traversal;
use crate::model::{EpisodeRecord, SubtitleTrack};
use crate::{EngineError, Result};

use self::models::{Episode, Season, SeriesDocument};

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn episodes(&self, catalog_url: &str, traversal: Traversal) -> Result<Vec<EpisodeRecord>>;
}

/// Catalog served as a JSON series document over HTTP.
///
/// A URL fragment of the form `#episode=<id>` names the episode used by
/// [`Traversal::SingleEpisode`].
pub struct HttpCatalog {
    client: Client,
    default_subtitle_lang: String,
}

impl HttpCatalog {
    pub fn new(client: Client, default_subtitle_lang: impl Into<String>) -> Self {
        Self {
            client,
            default_subtitle_lang: default_subtitle_lang.into(),
        }
    }
}

#[async_trait]
impl CatalogSource for HttpCatalog {
    async fn episodes(&self, catalog_url: &str, traversal: Traversal) -> Result<Vec<EpisodeRecord>> {
        let mut url = Url::parse(catalog_url)?;
        let episode_id = url.fragment().and_then(|f| f.strip_prefix("episode=")).map(str::to_string);
        url.set_fragment(None);

        debug!(url = %url, "Fetching catalog");
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(EngineError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        let document: SeriesDocument = serde_json::from_str(&body)?;
        info!(
            series_id = %document.series_id,
            title = %document.title,
            seasons = document.seasons.len(),
            "Loaded catalog"
        );

        select_episodes(
            &document,
            traversal,
            episode_id.as_deref(),
            &self.default_subtitle_lang,
        )
    }
}

/// Picks the episodes a traversal mode covers, in catalog order.
pub fn select_episodes(
    document: &SeriesDocument,
    traversal: Traversal,
    episode_id: Option<&str>,
    default_subtitle_lang: &str,
) -> Result<Vec<EpisodeRecord>> {
    let to_record = |season: &Season, episode: &Episode| {
        episode_record(document, season, episode, default_subtitle_lang)
    };

    let records: Vec<EpisodeRecord> = match traversal {
        Traversal::AllSeasons => document
            .seasons
            .iter()
            .flat_map(|season| season.episodes.iter().map(move |episode| (season, episode)))
            .map(|(season, episode)| to_record(season, episode))
            .collect(),
        Traversal::CurrentSeason => {
            let season = current_season(document)?;
            season.episodes.iter().map(|episode| to_record(season, episode)).collect()
        }
        Traversal::SingleEpisode => {
            let found = episode_id.and_then(|id| {
                document.seasons.iter().find_map(|season| {
                    season
                        .episodes
                        .iter()
                        .find(|episode| episode.episode_id == id)
                        .map(|episode| (season, episode))
                })
            });
            let (season, episode) = match found {
                Some(pair) => pair,
                None => {
                    if let Some(id) = episode_id {
                        warn!(episode_id = id, "Episode not in catalog, using the first one");
                    }
                    let season = current_season(document)?;
                    let episode = season.episodes.first().ok_or_else(|| {
                        EngineError::Catalog(format!("season {} has no episodes", season.number))
                    })?;
                    (season, episode)
                }
            };
            vec![to_record(season, episode)]
        }
    };

    Ok(records)
}

fn current_season(document: &SeriesDocument) -> Result<&Season> {
    let season = match document.current_season {
        Some(number) => document.seasons.iter().find(|s| s.number == number),
        None => document.seasons.last(),
    };
    season.ok_or_else(|| EngineError::Catalog(format!("no current season for {}", document.title)))
}

fn episode_record(
    document: &SeriesDocument,
    season: &Season,
    episode: &Episode,
    default_subtitle_lang: &str,
) -> EpisodeRecord {
    let asset = episode.media_assets.iter().find(|asset| !asset.url.is_empty());
    let media_kind = asset.and_then(|a| a.kind).unwrap_or(document.media_kind);

    let subtitles = match (&episode.subtitles_url, episode.has_subtitles) {
        (Some(url), true) => Some(SubtitleTrack {
            url: url.clone(),
            lang: episode
                .subtitles_lang
                .clone()
                .unwrap_or_else(|| default_subtitle_lang.to_string()),
        }),
        _ => None,
    };

    EpisodeRecord {
        display_title: episode.title.clone(),
        series_title: document.title.clone(),
        source_url: asset.map(|a| a.url.clone()).unwrap_or_default(),
        media_kind,
        season: Some(season.number),
        episode_label: episode.episode_number_or_date.as_ref().map(ToString::to_string),
        unavailable_reason: episode.unavailable_reason.clone(),
        subtitles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MediaKind;

    const DOCUMENT: &str = r#"{
        "seriesId": "s-42",
        "title": "Night Shift",
        "currentSeason": 1,
        "seasons": [
            {"number": 1, "episodes": [
                {"episodeId": "e1", "title": "Pilot", "episodeNumberOrDate": 1,
                 "mediaAssets": [{"url": "http://x/e1/master.m3u8"}],
                 "hasSubtitles": true, "subtitlesUrl": "http://x/e1.vtt"},
                {"episodeId": "e2", "title": "Second", "episodeNumberOrDate": 2,
                 "mediaAssets": [], "unavailableReason": "expired"}
            ]},
            {"number": 2, "episodes": [
                {"episodeId": "e3", "title": "Return", "episodeNumberOrDate": "2024-03-01",
                 "mediaAssets": [{"url": "http://x/e3.mp3", "kind": "audio"}],
                 "hasSubtitles": false, "subtitlesUrl": "http://x/e3.vtt"}
            ]}
        ]
    }"#;

    fn document() -> SeriesDocument {
        serde_json::from_str(DOCUMENT).unwrap()
    }

    #[test]
    fn test_current_season() {
        let records = select_episodes(&document(), Traversal::CurrentSeason, None, "en").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].source_url, "http://x/e1/master.m3u8");
        assert_eq!(records[0].episode_label.as_deref(), Some("01"));
        assert_eq!(
            records[0].subtitles,
            Some(SubtitleTrack {
                url: "http://x/e1.vtt".to_string(),
                lang: "en".to_string()
            })
        );
        assert_eq!(records[1].source_url, "");
        assert_eq!(records[1].unavailable_reason.as_deref(), Some("expired"));
    }

    #[test]
    fn test_all_seasons_in_order() {
        let records = select_episodes(&document(), Traversal::AllSeasons, None, "en").unwrap();
        let titles: Vec<_> = records.iter().map(|r| r.display_title.as_str()).collect();
        assert_eq!(titles, ["Pilot", "Second", "Return"]);
        assert_eq!(records[2].media_kind, MediaKind::Audio);
        assert_eq!(records[2].season, Some(2));
        assert_eq!(records[2].episode_label.as_deref(), Some("2024-03-01"));
        assert_eq!(records[2].subtitles, None);
    }

    #[test]
    fn test_single_episode() {
        let records = select_episodes(&document(), Traversal::SingleEpisode, Some("e3"), "en").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].display_title, "Return");

        let records = select_episodes(&document(), Traversal::SingleEpisode, Some("zz"), "en").unwrap();
        assert_eq!(records[0].display_title, "Pilot");
    }

    #[test]
    fn test_missing_current_season() {
        let mut doc = document();
        doc.current_season = Some(9);
        assert!(matches!(
            select_episodes(&doc, Traversal::CurrentSeason, None, "en"),
            Err(EngineError::Catalog(_))
        ));
    }
}
