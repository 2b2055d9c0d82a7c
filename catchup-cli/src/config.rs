use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use catchup_engine::config::DEFAULT_UA;
use catchup_engine::{NamingMode, RunConfiguration, Traversal, VariantSelection};
use serde::{Deserialize, Serialize};

use crate::cli::CliArgs;

const APP_NAME: &str = "catchup";

/// Persistent defaults; command-line flags take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default output directory
    pub default_output_dir: Option<PathBuf>,

    /// Language code for subtitle sidecars when the catalog has none
    pub subtitle_lang: String,

    /// User agent string for requests
    pub user_agent: String,

    /// Request timeout in seconds
    pub http_timeout_secs: u64,

    /// Download subtitles by default
    pub subtitles: bool,

    pub season_folders: bool,

    pub numbered_names: bool,

    /// Enable colored output
    pub colored_output: bool,

    /// Subtitle converter command line (WebVTT on stdin, SubRip on stdout).
    /// Empty uses the transcoder.
    pub subtitle_converter: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_output_dir: None,
            subtitle_lang: "en".to_string(),
            user_agent: DEFAULT_UA.to_string(),
            http_timeout_secs: 30,
            subtitles: true,
            season_folders: false,
            numbered_names: false,
            colored_output: true,
            subtitle_converter: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file, or from the confy location
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        match config_path {
            Some(path) => {
                if path.exists() {
                    let content = std::fs::read_to_string(path)
                        .context("Failed to read configuration file")?;
                    toml::from_str(&content).context("Failed to parse configuration file")
                } else {
                    Ok(Self::default())
                }
            }
            None => confy::load(APP_NAME, None).context("Failed to load configuration"),
        }
    }

    /// Merges command-line flags over the stored defaults.
    pub fn run_configuration(&self, args: &CliArgs) -> RunConfiguration {
        let traversal = if args.all_seasons {
            Traversal::AllSeasons
        } else if args.single {
            Traversal::SingleEpisode
        } else {
            Traversal::CurrentSeason
        };

        let naming = if args.numbered || self.numbered_names {
            NamingMode::Numbered
        } else {
            NamingMode::Title
        };

        let variant_selection = if args.select_quality {
            VariantSelection::Interactive
        } else {
            VariantSelection::Automatic
        };

        let target_dir = args
            .output_dir
            .clone()
            .or_else(|| self.default_output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        RunConfiguration::builder()
            .dry_run(args.dry_run)
            .no_confirm(args.no_confirm)
            .variant_selection(variant_selection)
            .subtitles(self.subtitles && !args.no_subtitles)
            .subtitle_lang(args.subtitle_lang.clone().unwrap_or_else(|| self.subtitle_lang.clone()))
            .naming(naming)
            .season_folders(args.season_folders || self.season_folders)
            .target_dir(target_dir)
            .traversal(traversal)
            .http_timeout(Duration::from_secs(args.timeout.unwrap_or(self.http_timeout_secs)))
            .user_agent(self.user_agent.clone())
            .build()
    }
}
