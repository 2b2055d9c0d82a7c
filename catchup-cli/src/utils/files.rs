use std::path::{Path, PathBuf};

use catchup_engine::{EpisodeRecord, NamingMode, RunConfiguration};

use crate::error::AppError;

const MAX_NAME_LEN: usize = 200;

/// Creates all directories in the given path, including parent directories if they don't exist.
#[inline]
pub async fn create_dirs(path: &Path) -> Result<(), AppError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(AppError::Io)?;
    Ok(())
}

/// Replaces characters that are illegal on common filesystems.
///
/// Control characters are dropped, reserved characters become `_`, and
/// leading/trailing dots and spaces are trimmed. Never returns an empty name.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();

    let trimmed = replaced.trim_matches(|c: char| c == '.' || c.is_whitespace());
    let mut name: String = trimmed.chars().take(MAX_NAME_LEN).collect();
    if name.is_empty() {
        name.push_str("episode");
    }
    name
}

/// File name (with extension) for an episode under the given naming mode.
///
/// Numbered names use `SxxEyy` when the catalog publishes an episode number
/// and the raw label (usually an air date) otherwise. Episodes without a
/// label fall back to their title.
pub fn episode_file_name(record: &EpisodeRecord, naming: NamingMode) -> String {
    let suffix = match (naming, &record.episode_label) {
        (NamingMode::Numbered, Some(label)) => match (record.season, label.parse::<u32>()) {
            (Some(season), Ok(number)) => format!("S{season:02}E{number:02}"),
            _ => label.clone(),
        },
        _ => record.display_title.clone(),
    };

    let stem = if record.series_title.is_empty() {
        suffix
    } else {
        format!("{} - {suffix}", record.series_title)
    };
    format!("{}.{}", sanitize_filename(&stem), record.media_kind.extension())
}

/// Final path for an episode: `<target>/<series>/[Season NN/]<file>`.
pub fn destination_path(config: &RunConfiguration, record: &EpisodeRecord) -> PathBuf {
    let mut path = config.target_dir.clone();
    if !record.series_title.is_empty() {
        path.push(sanitize_filename(&record.series_title));
    }
    if config.season_folders {
        if let Some(season) = record.season {
            path.push(format!("Season {season:02}"));
        }
    }
    path.push(episode_file_name(record, config.naming));
    path
}
