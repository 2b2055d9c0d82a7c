use std::fmt;

use serde::Deserialize;

use crate::model::MediaKind;

/// The catalog document for one series.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDocument {
    pub series_id: String,
    pub title: String,
    #[serde(default)]
    pub media_kind: MediaKind,
    pub current_season: Option<u32>,
    #[serde(default)]
    pub seasons: Vec<Season>,
}

#[derive(Debug, Deserialize)]
pub struct Season {
    pub number: u32,
    #[serde(default)]
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub episode_id: String,
    pub title: String,
    pub episode_number_or_date: Option<NumberOrDate>,
    #[serde(default)]
    pub media_assets: Vec<MediaAsset>,
    #[serde(default)]
    pub has_subtitles: bool,
    pub subtitles_url: Option<String>,
    pub subtitles_lang: Option<String>,
    pub unavailable_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MediaAsset {
    pub url: String,
    pub kind: Option<MediaKind>,
}

/// Episodes are numbered, or identified by air date for daily shows.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum NumberOrDate {
    Number(u32),
    Text(String),
}

impl fmt::Display for NumberOrDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberOrDate::Number(n) => write!(f, "{n:02}"),
            NumberOrDate::Text(text) => write!(f, "{text}"),
        }
    }
}
