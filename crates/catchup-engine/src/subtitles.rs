use std::path::{Path, PathBuf};

use reqwest::Client;
use tracing::{debug, info};

use crate::model::SubtitleTrack;
use crate::toolchain::MediaToolchain;
use crate::{EngineError, Result};

/// `<destination without extension>.<lang>.srt`
pub fn sidecar_path(destination: &Path, lang: &str) -> PathBuf {
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    destination.with_file_name(format!("{stem}.{lang}.srt"))
}

/// Downloads a caption track and stores it as a SubRip sidecar.
///
/// Returns `None` when the sidecar already exists; it is never replaced.
pub async fn fetch_sidecar(
    client: &Client,
    toolchain: &dyn MediaToolchain,
    track: &SubtitleTrack,
    destination: &Path,
) -> Result<Option<PathBuf>> {
    let sidecar = sidecar_path(destination, &track.lang);
    if tokio::fs::try_exists(&sidecar).await? {
        debug!(path = %sidecar.display(), "Subtitle sidecar already present");
        return Ok(None);
    }

    let response = client.get(&track.url).send().await?;
    if !response.status().is_success() {
        return Err(EngineError::Status {
            status: response.status(),
            url: track.url.clone(),
        });
    }
    let markup = response.text().await?;

    let srt = toolchain.convert_subtitles(&markup).await?;
    if srt.trim().is_empty() {
        return Err(EngineError::Subtitles("converter produced no output".to_string()));
    }

    tokio::fs::write(&sidecar, srt)
        .await
        .map_err(|e| EngineError::path_io(&sidecar, e))?;
    info!(path = %sidecar.display(), "Saved subtitles");
    Ok(Some(sidecar))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeToolchain;

    #[test]
    fn test_sidecar_path() {
        assert_eq!(
            sidecar_path(Path::new("/media/Show/Show - S01E02.mp4"), "it"),
            PathBuf::from("/media/Show/Show - S01E02.it.srt")
        );
    }

    #[tokio::test]
    async fn test_existing_sidecar_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("ep.mp4");
        let sidecar = sidecar_path(&destination, "en");
        std::fs::write(&sidecar, "original").unwrap();

        let track = SubtitleTrack {
            // never fetched
            url: "http://127.0.0.1:9/subs.vtt".to_string(),
            lang: "en".to_string(),
        };
        let toolchain = FakeToolchain::new(Some(10.0), Vec::<String>::new());
        let result = fetch_sidecar(&Client::new(), &toolchain, &track, &destination)
            .await
            .unwrap();
        assert_eq!(result, None);
        assert_eq!(std::fs::read_to_string(&sidecar).unwrap(), "original");
    }
}
