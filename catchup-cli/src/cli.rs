use clap::{ArgGroup, Parser};
use std::path::PathBuf;

/// Define CLI arguments
#[derive(Parser, Debug)]
#[command(
    name = "catchup",
    version,
    about = "Catch-up TV and radio downloader",
    long_about = "Downloads every episode listed by one or more catalog URLs.\n\
                  \n\
                  For each episode the best HLS variant is selected, its duration is probed\n\
                  and ffmpeg (or avconv) copies the stream into a local file while a live\n\
                  status line shows progress. Subtitles are saved as SubRip sidecar files."
)]
#[command(group(
    ArgGroup::new("traversal").args(["all_seasons", "current_season", "single"])
))]
pub struct CliArgs {
    /// Catalog URL(s) of the series to download
    #[arg(required = true, help = "Catalog URL(s); append #episode=<id> to pick one episode")]
    pub urls: Vec<String>,

    /// Output directory for downloaded files
    #[arg(short, long, help = "Directory where episodes are saved (default: current directory)")]
    pub output_dir: Option<PathBuf>,

    /// Only check availability and duration
    #[arg(short = 'n', long, help = "Report availability and duration without downloading")]
    pub dry_run: bool,

    #[arg(long, help = "Do not download subtitles")]
    pub no_subtitles: bool,

    #[arg(long, help = "Name files by season/episode number instead of episode title")]
    pub numbered: bool,

    #[arg(long, help = "Put each season in its own folder")]
    pub season_folders: bool,

    #[arg(short = 's', long, help = "Choose the stream quality interactively")]
    pub select_quality: bool,

    #[arg(long, help = "Never ask before overwriting; existing files are skipped")]
    pub no_confirm: bool,

    #[arg(short = 'a', long, help = "Download every season")]
    pub all_seasons: bool,

    #[arg(long, help = "Download the current season only (default)")]
    pub current_season: bool,

    #[arg(long, help = "Download a single episode (the one named by #episode=<id>, else the first)")]
    pub single: bool,

    #[arg(long, help = "Language code used for subtitle files when the catalog has none")]
    pub subtitle_lang: Option<String>,

    #[arg(long, help = "HTTP timeout in seconds for catalog, playlist and subtitle requests")]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, help = "Enable detailed debug logging")]
    pub verbose: bool,

    #[arg(short, long, conflicts_with = "verbose", help = "Only log errors")]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "CATCHUP_CONFIG", help = "Configuration file (TOML)")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_traversal_flags_conflict() {
        let result = CliArgs::try_parse_from(["catchup", "--all-seasons", "--single", "http://x/s"]);
        assert!(result.is_err());

        let args = CliArgs::try_parse_from(["catchup", "-n", "--no-confirm", "http://x/a", "http://x/b"]).unwrap();
        assert!(args.dry_run && args.no_confirm);
        assert_eq!(args.urls.len(), 2);
    }
}
