//! HLS playlist handling: variant ranking, selection and URL resolution.

use std::sync::LazyLock;

use async_trait::async_trait;
use m3u8_rs::Playlist;
use regex::Regex;
use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::config::VariantSelection;
use crate::model::StreamVariant;
use crate::prompt::{Prompter, choose_variant};
use crate::{EngineError, Result};

static LEGACY_HDS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<host>https?://[^/]+)/z/(?P<path>.+)/manifest\.f4m(?:\?.*)?$").unwrap()
});

static BANDWIDTH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[:,])BANDWIDTH=(\d+)").unwrap());

static RESOLUTION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RESOLUTION=(\d+)x(\d+)").unwrap());

static URI_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9+.-]*://\S+|[\w./~%-]+\S*)$").unwrap());

/// Tags that only appear in master playlists.
const MASTER_TAGS: [&str; 3] = ["#EXT-X-STREAM-INF", "#EXT-X-I-FRAME-STREAM-INF", "#EXT-X-MEDIA:"];

/// What a fetched `.m3u8` body turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaylistKind {
    /// Variants ranked by descending bandwidth. May be empty.
    Master(Vec<StreamVariant>),
    /// A single rendition's segment list, playable as is.
    Media,
}

/// Fetches playlist bodies.
#[async_trait]
pub trait PlaylistFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

pub struct HttpPlaylistFetcher {
    client: Client,
}

impl HttpPlaylistFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PlaylistFetcher for HttpPlaylistFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(EngineError::Status {
                status: response.status(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Rewrites an Akamai HDS identifier (`/z/.../manifest.f4m`) to the HLS
/// master playlist served for the same asset (`/i/.../master.m3u8`).
/// Other URLs are returned unchanged.
pub fn rewrite_legacy_url(url: &str) -> String {
    match LEGACY_HDS_REGEX.captures(url) {
        Some(caps) => {
            let rewritten = format!("{}/i/{}/master.m3u8", &caps["host"], &caps["path"]);
            debug!(from = %url, to = %rewritten, "Rewrote legacy HDS URL");
            rewritten
        }
        None => url.to_string(),
    }
}

/// Whether the URL points at an HLS playlist, which may still need variant
/// selection. The body decides whether it is a master or a media playlist.
pub fn is_master_playlist_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase().ends_with(".m3u8"),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .is_some_and(|path| path.to_ascii_lowercase().ends_with(".m3u8")),
    }
}

/// Classifies a playlist body and ranks the variants of a master playlist.
///
/// Equal bandwidths keep their playlist order. Bodies the strict parser
/// rejects are scanned leniently; one that looks like neither kind of
/// playlist is an [`EngineError::Playlist`].
pub fn parse_variants(master_text: &str) -> Result<PlaylistKind> {
    let mut variants = match m3u8_rs::parse_playlist_res(master_text.as_bytes()) {
        Ok(Playlist::MasterPlaylist(playlist)) => playlist
            .variants
            .into_iter()
            .filter(|variant| !variant.is_i_frame)
            .map(|variant| StreamVariant {
                bandwidth: variant.bandwidth,
                resolution: variant.resolution.map(|r| (r.width, r.height)),
                uri: variant.uri,
            })
            .collect(),
        Ok(Playlist::MediaPlaylist(_)) => return Ok(PlaylistKind::Media),
        Err(e) if MASTER_TAGS.iter().any(|tag| master_text.contains(tag)) => {
            warn!("Playlist rejected by the strict parser ({e}), scanning records instead");
            scan_variants(master_text)
        }
        Err(_) if master_text.contains("#EXTINF") => return Ok(PlaylistKind::Media),
        Err(e) => return Err(EngineError::Playlist(format!("not an HLS playlist: {e}"))),
    };

    // `sort_by` is stable, so ties keep document order.
    variants.sort_by(|a, b| b.bandwidth.cmp(&a.bandwidth));
    Ok(PlaylistKind::Master(variants))
}

/// Lenient record scan for playlists the strict parser refuses.
fn scan_variants(master_text: &str) -> Vec<StreamVariant> {
    let mut variants = Vec::new();
    let mut pending: Option<(u64, Option<(u64, u64)>)> = None;

    for line in master_text.lines().map(str::trim) {
        if let Some(attributes) = line.strip_prefix("#EXT-X-STREAM-INF:") {
            let bandwidth = BANDWIDTH_REGEX
                .captures(attributes)
                .and_then(|caps| caps[1].parse().ok())
                .unwrap_or(0);
            let resolution = RESOLUTION_REGEX.captures(attributes).and_then(|caps| {
                Some((caps[1].parse().ok()?, caps[2].parse().ok()?))
            });
            pending = Some((bandwidth, resolution));
            continue;
        }
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((bandwidth, resolution)) = pending.take() {
            if URI_TOKEN_REGEX.is_match(line) {
                variants.push(StreamVariant {
                    bandwidth,
                    resolution,
                    uri: line.to_string(),
                });
            }
        }
    }

    variants
}

/// Resolves a variant URI against the master playlist URL.
///
/// Absolute URIs pass through untouched; relative ones replace the last
/// path segment of the master URL.
pub fn resolve_variant_url(master_url: &str, uri: &str) -> Result<String> {
    if Url::parse(uri).is_ok() {
        return Ok(uri.to_string());
    }
    let base = Url::parse(master_url)?;
    Ok(base.join(uri)?.to_string())
}

/// Picks a variant from a master playlist and returns its absolute URL.
///
/// A media playlist is already a direct media URL and is returned as is.
/// Returns an empty string when a master playlist lists no variants; callers
/// treat that as an unavailable stream.
pub fn resolve(
    master_text: &str,
    master_url: &str,
    selection: VariantSelection,
    prompter: &dyn Prompter,
) -> Result<String> {
    let variants = match parse_variants(master_text)? {
        PlaylistKind::Master(variants) => variants,
        PlaylistKind::Media => {
            debug!(url = %master_url, "Media playlist, no variant selection needed");
            return Ok(master_url.to_string());
        }
    };
    if variants.is_empty() {
        warn!(url = %master_url, "Master playlist has no variants");
        return Ok(String::new());
    }

    let index = match selection {
        VariantSelection::Automatic => 0,
        VariantSelection::Interactive => choose_variant(prompter, &variants)?,
    };
    let chosen = &variants[index];
    debug!(
        bandwidth = chosen.bandwidth,
        resolution = %chosen.resolution_label(),
        uri = %chosen.uri,
        "Selected variant"
    );

    resolve_variant_url(master_url, &chosen.uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedPrompter;

    const MASTER: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-STREAM-INF:BANDWIDTH=480000,RESOLUTION=640x360,CODECS=\"avc1.4d401e,mp4a.40.2\"
low.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=1200000,RESOLUTION=1280x720,CODECS=\"avc1.4d401f,mp4a.40.2\"
high.m3u8
";

    #[test]
    fn test_automatic_picks_highest_bandwidth() {
        let prompter = ScriptedPrompter::new(Vec::<&str>::new());
        let url = resolve(
            MASTER,
            "http://x/a/master.m3u8",
            VariantSelection::Automatic,
            &prompter,
        )
        .unwrap();
        assert_eq!(url, "http://x/a/high.m3u8");
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn test_ranking_is_descending_and_stable() {
        let text = "#EXTM3U
#EXT-X-STREAM-INF:BANDWIDTH=800000
first.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=2000000,RESOLUTION=1920x1080
best.m3u8
#EXT-X-STREAM-INF:BANDWIDTH=800000
second.m3u8
";
        let PlaylistKind::Master(variants) = parse_variants(text).unwrap() else {
            panic!("expected a master playlist");
        };
        let uris: Vec<_> = variants.iter().map(|v| v.uri.as_str()).collect();
        assert_eq!(uris, ["best.m3u8", "first.m3u8", "second.m3u8"]);
        assert!(variants.iter().all(|v| v.bandwidth <= variants[0].bandwidth));
        assert_eq!(variants[1].resolution, None);
    }

    #[test]
    fn test_interactive_selection() {
        let prompter = ScriptedPrompter::new(["1"]);
        let url = resolve(
            MASTER,
            "http://x/a/master.m3u8",
            VariantSelection::Interactive,
            &prompter,
        )
        .unwrap();
        assert_eq!(url, "http://x/a/low.m3u8");
        assert!(prompter.shown().iter().any(|l| l.contains("640x360")));
    }

    #[test]
    fn test_relative_and_absolute_resolution() {
        assert_eq!(
            resolve_variant_url("https://h/path/master.m3u8", "index-v1.m3u8").unwrap(),
            "https://h/path/index-v1.m3u8"
        );
        assert_eq!(
            resolve_variant_url("https://h/path/master.m3u8", "https://cdn/other/v.m3u8?t=1")
                .unwrap(),
            "https://cdn/other/v.m3u8?t=1"
        );
    }

    #[test]
    fn test_no_variants_yields_empty_url() {
        let prompter = ScriptedPrompter::new(Vec::<&str>::new());
        // Only an i-frame rendition, which is never selected.
        let master = "#EXTM3U\n#EXT-X-I-FRAME-STREAM-INF:BANDWIDTH=86000,URI=\"iframe.m3u8\"\n";
        let url = resolve(master, "http://x/a/master.m3u8", VariantSelection::Automatic, &prompter)
            .unwrap();
        assert!(url.is_empty());
    }

    #[test]
    fn test_media_playlist_passes_through() {
        let prompter = ScriptedPrompter::new(Vec::<&str>::new());
        let media = "#EXTM3U\n#EXT-X-TARGETDURATION:10\n#EXTINF:10,\nseg0.ts\n#EXT-X-ENDLIST\n";
        assert_eq!(parse_variants(media).unwrap(), PlaylistKind::Media);
        let url = resolve(media, "http://x/radio/index.m3u8", VariantSelection::Interactive, &prompter)
            .unwrap();
        assert_eq!(url, "http://x/radio/index.m3u8");
        assert!(prompter.asked().is_empty());
    }

    #[test]
    fn test_unrecognised_body_is_a_playlist_error() {
        let prompter = ScriptedPrompter::new(Vec::<&str>::new());
        let result = resolve(
            "<html>not found</html>",
            "http://x/a/master.m3u8",
            VariantSelection::Automatic,
            &prompter,
        );
        assert!(matches!(result, Err(EngineError::Playlist(_))));
    }

    #[test]
    fn test_lenient_scan() {
        let text = "#EXT-X-STREAM-INF:PROGRAM-ID=1,BANDWIDTH=96000\nhttp://radio/a.m3u8\n\
                    #EXT-X-STREAM-INF:PROGRAM-ID=1,BANDWIDTH=192000\nhttp://radio/b.m3u8\n";
        let variants = scan_variants(text);
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[1].bandwidth, 192000);
        assert_eq!(variants[0].uri, "http://radio/a.m3u8");
    }

    #[test]
    fn test_legacy_rewrite() {
        assert_eq!(
            rewrite_legacy_url("http://cdn.example.net/z/vod/show/ep1_,400,800,.mp4.csmil/manifest.f4m?hdcore=3"),
            "http://cdn.example.net/i/vod/show/ep1_,400,800,.mp4.csmil/master.m3u8"
        );
        assert_eq!(
            rewrite_legacy_url("http://cdn.example.net/i/a/master.m3u8"),
            "http://cdn.example.net/i/a/master.m3u8"
        );
    }

    #[test]
    fn test_master_playlist_detection() {
        assert!(is_master_playlist_url("https://h/a/master.m3u8?token=abc"));
        assert!(!is_master_playlist_url("https://h/a/video.mp4"));
        assert!(is_master_playlist_url("not a url/master.M3U8"));
    }
}
