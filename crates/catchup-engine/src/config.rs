use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/136.0.0.0 Safari/537.36";

/// How episode files are named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NamingMode {
    /// `<series> - <episode title>`
    #[default]
    Title,
    /// `<series> - S01E03` (or the air date when no number is published)
    Numbered,
}

/// Which part of a catalog to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Traversal {
    AllSeasons,
    #[default]
    CurrentSeason,
    SingleEpisode,
}

/// How a quality variant is picked from a master playlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariantSelection {
    /// Always the highest bandwidth.
    #[default]
    Automatic,
    /// Ask the operator.
    Interactive,
}

/// Options for a whole run, built once at startup.
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    pub dry_run: bool,
    /// Never prompt for overwrites; existing files are skipped.
    pub no_confirm: bool,
    pub variant_selection: VariantSelection,
    pub subtitles: bool,
    pub subtitle_lang: String,
    pub naming: NamingMode,
    pub season_folders: bool,
    pub target_dir: PathBuf,
    pub traversal: Traversal,
    pub http_timeout: Duration,
    pub user_agent: String,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            dry_run: false,
            no_confirm: false,
            variant_selection: VariantSelection::Automatic,
            subtitles: true,
            subtitle_lang: "en".to_string(),
            naming: NamingMode::Title,
            season_folders: false,
            target_dir: PathBuf::from("."),
            traversal: Traversal::CurrentSeason,
            http_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_UA.to_string(),
        }
    }
}

impl RunConfiguration {
    pub fn builder() -> RunConfigurationBuilder {
        RunConfigurationBuilder::default()
    }

    /// Builds the HTTP client shared by the catalog, playlist and subtitle fetches.
    pub fn http_client(&self) -> crate::Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.http_timeout)
            .build()?;
        Ok(client)
    }
}

#[derive(Debug, Default)]
pub struct RunConfigurationBuilder {
    config: RunConfiguration,
}

impl RunConfigurationBuilder {
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    pub fn no_confirm(mut self, no_confirm: bool) -> Self {
        self.config.no_confirm = no_confirm;
        self
    }

    pub fn variant_selection(mut self, selection: VariantSelection) -> Self {
        self.config.variant_selection = selection;
        self
    }

    pub fn subtitles(mut self, subtitles: bool) -> Self {
        self.config.subtitles = subtitles;
        self
    }

    pub fn subtitle_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.subtitle_lang = lang.into();
        self
    }

    pub fn naming(mut self, naming: NamingMode) -> Self {
        self.config.naming = naming;
        self
    }

    pub fn season_folders(mut self, season_folders: bool) -> Self {
        self.config.season_folders = season_folders;
        self
    }

    pub fn target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.target_dir = dir.into();
        self
    }

    pub fn traversal(mut self, traversal: Traversal) -> Self {
        self.config.traversal = traversal;
        self
    }

    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> RunConfiguration {
        self.config
    }
}
