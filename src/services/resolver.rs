//! Page-scraping metadata resolver
//!
//! Fetches watch and playlist pages over HTTP and pulls metadata out of the
//! embedded player JSON, falling back to page-level markup where the JSON
//! is missing a field.

use super::{Resolver, build_http_client, error_for_status};
use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use crate::types::{PlaylistInfo, TrackInfo};
use crate::utils::{extract_playlist_id, extract_video_id};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)]
static OG_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<meta property="og:title" content="([^"]+)""#).unwrap());

#[allow(clippy::unwrap_used)]
static PAGE_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title>(.*?)</title>").unwrap());

#[allow(clippy::unwrap_used)]
static DESCRIPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<meta name="description" content="([^"]+)""#).unwrap());

#[allow(clippy::unwrap_used)]
static AUTHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""author":"([^"]+)""#).unwrap());

#[allow(clippy::unwrap_used)]
static BYLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"by (.*?)\s*\|").unwrap());

#[allow(clippy::unwrap_used)]
static ALBUM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"from (.*?)\s*\|").unwrap());

#[allow(clippy::unwrap_used)]
static LENGTH_SECONDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""lengthSeconds":"(\d+)""#).unwrap());

#[allow(clippy::unwrap_used)]
static PUBLISH_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""publishDate":"(\d{4})"#).unwrap());

#[allow(clippy::unwrap_used)]
static TRACK_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\d+)\s+(?:songs|videos|tracks)"#).unwrap());

#[allow(clippy::unwrap_used)]
static ENTRY_VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""videoId":"([a-zA-Z0-9_-]{11})""#).unwrap());

#[allow(clippy::unwrap_used)]
static ENTRY_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""title":\{(?:"runs":\[\{"text"|"simpleText"):"([^"]+)""#).unwrap()
});

#[allow(clippy::unwrap_used)]
static ENTRY_BYLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""shortBylineText":\{"runs":\[\{"text":"([^"]+)""#).unwrap()
});

/// Metadata resolver backed by page scraping
#[derive(Debug, Clone)]
pub struct PageResolver {
    client: reqwest::Client,
}

impl PageResolver {
    /// Build a resolver with a client configured from `network`
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(network)?,
        })
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    elapsed: std::time::Duration::ZERO,
                }
            } else {
                Error::Network(e)
            }
        })?;
        if let Some(err) = error_for_status(&response) {
            return Err(err);
        }
        Ok(response.text().await?)
    }
}

fn first_capture(re: &Regex, page: &str) -> Option<String> {
    re.captures(page)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Page title with the site suffix stripped
fn extract_title(page: &str) -> Option<String> {
    let raw = first_capture(&OG_TITLE_RE, page).or_else(|| first_capture(&PAGE_TITLE_RE, page))?;
    let title = raw
        .strip_suffix(" - YouTube Music")
        .or_else(|| raw.strip_suffix(" - YouTube"))
        .unwrap_or(&raw)
        .trim()
        .to_string();
    if title.is_empty() { None } else { Some(title) }
}

fn extract_track(page: &str, video_id: &str) -> Result<TrackInfo> {
    let title = extract_title(page)
        .ok_or_else(|| Error::Parse(format!("no title found on page for video {video_id}")))?;
    let artist = first_capture(&AUTHOR_RE, page)
        .or_else(|| first_capture(&BYLINE_RE, page))
        .unwrap_or_else(|| "Unknown Artist".to_string());
    let duration_secs = first_capture(&LENGTH_SECONDS_RE, page).and_then(|s| s.parse().ok());
    let year = first_capture(&PUBLISH_YEAR_RE, page).and_then(|s| s.parse().ok());

    Ok(TrackInfo {
        id: video_id.to_string(),
        title,
        artist,
        album: first_capture(&ALBUM_RE, page),
        genre: None,
        duration_secs,
        year,
        track_number: None,
        disc_number: None,
        explicit: None,
        thumbnail: Some(format!(
            "https://img.youtube.com/vi/{video_id}/maxresdefault.jpg"
        )),
        url: format!("https://www.youtube.com/watch?v={video_id}"),
    })
}

/// Member tracks from a playlist page.
///
/// Entries missing a video id or title are skipped rather than failing the
/// whole playlist.
fn extract_playlist_tracks(page: &str) -> Vec<TrackInfo> {
    let mut tracks = Vec::new();
    let mut chunks = page.split("\"playlistVideoRenderer\"");
    // Everything before the first renderer is page chrome
    chunks.next();
    for (index, chunk) in chunks.enumerate() {
        let Some(id) = first_capture(&ENTRY_VIDEO_ID_RE, chunk) else {
            tracing::debug!(index, "skipping playlist entry without a video id");
            continue;
        };
        let Some(title) = first_capture(&ENTRY_TITLE_RE, chunk) else {
            tracing::debug!(index, video_id = %id, "skipping playlist entry without a title");
            continue;
        };
        let artist = first_capture(&ENTRY_BYLINE_RE, chunk)
            .unwrap_or_else(|| "Unknown Artist".to_string());
        let duration_secs = first_capture(&LENGTH_SECONDS_RE, chunk)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let url = format!("https://www.youtube.com/watch?v={id}");
        tracks.push(TrackInfo {
            thumbnail: Some(format!("https://img.youtube.com/vi/{id}/maxresdefault.jpg")),
            id,
            title,
            artist,
            album: None,
            genre: None,
            duration_secs: Some(duration_secs),
            year: None,
            track_number: Some((index + 1) as u32),
            disc_number: None,
            explicit: None,
            url,
        });
    }
    tracks
}

#[async_trait]
impl Resolver for PageResolver {
    async fn resolve_track(&self, url: &str) -> Result<TrackInfo> {
        let video_id = extract_video_id(url)
            .ok_or_else(|| Error::InvalidUrl(format!("not a recognized track URL: {url}")))?;
        tracing::debug!(%video_id, "resolving track metadata");
        let page = self.fetch_page(url).await?;
        let track = extract_track(&page, &video_id)?;
        tracing::debug!(%video_id, title = %track.title, artist = %track.artist, "track resolved");
        Ok(track)
    }

    async fn resolve_playlist(&self, url: &str) -> Result<PlaylistInfo> {
        let playlist_id = extract_playlist_id(url)
            .ok_or_else(|| Error::InvalidUrl(format!("not a recognized playlist URL: {url}")))?;
        tracing::debug!(%playlist_id, "resolving playlist metadata");
        let page = self.fetch_page(url).await?;

        let title = extract_title(&page)
            .ok_or_else(|| Error::Parse(format!("no title found for playlist {playlist_id}")))?;
        let tracks = extract_playlist_tracks(&page);
        let track_count = first_capture(&TRACK_COUNT_RE, &page)
            .and_then(|s| s.parse().ok())
            .unwrap_or(tracks.len());

        let playlist = PlaylistInfo {
            id: playlist_id,
            title,
            description: first_capture(&DESCRIPTION_RE, &page),
            track_count,
            tracks,
            url: url.to_string(),
        };
        tracing::debug!(
            playlist_id = %playlist.id,
            tracks = playlist.tracks.len(),
            "playlist resolved"
        );
        Ok(playlist)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const WATCH_PAGE: &str = concat!(
        "<html><head>",
        r#"<meta property="og:title" content="Midnight Run - YouTube Music">"#,
        "<title>Midnight Run - YouTube Music</title></head>",
        r#"<body>{"author":"Night Drivers","lengthSeconds":"243","publishDate":"2021-03-14"}"#,
        "from Midnight Album | extra</body></html>",
    );

    const PLAYLIST_PAGE: &str = concat!(
        "<html><head>",
        r#"<meta property="og:title" content="Road Mix - YouTube">"#,
        r#"<meta name="description" content="Songs for long drives">"#,
        "</head><body>2 songs",
        r#"{"playlistVideoRenderer":{"videoId":"aaaaaaaaaaa","title":{"runs":[{"text":"First Song"}]},"shortBylineText":{"runs":[{"text":"Artist One"}]},"lengthSeconds":"120"}}"#,
        r#"{"playlistVideoRenderer":{"videoId":"bbbbbbbbbbb","title":{"runs":[{"text":"Second Song"}]},"lengthSeconds":"90"}}"#,
        "</body></html>",
    );

    #[test]
    fn track_metadata_is_extracted_from_embedded_json() {
        let track = extract_track(WATCH_PAGE, "dQw4w9WgXcQ").unwrap();
        assert_eq!(track.title, "Midnight Run");
        assert_eq!(track.artist, "Night Drivers");
        assert_eq!(track.album.as_deref(), Some("Midnight Album"));
        assert_eq!(track.duration_secs, Some(243));
        assert_eq!(track.year, Some(2021));
        assert_eq!(
            track.thumbnail.as_deref(),
            Some("https://img.youtube.com/vi/dQw4w9WgXcQ/maxresdefault.jpg")
        );
    }

    #[test]
    fn missing_artist_falls_back_to_unknown() {
        let page = "<title>Lonely Track - YouTube</title>";
        let track = extract_track(page, "xxxxxxxxxxx").unwrap();
        assert_eq!(track.title, "Lonely Track");
        assert_eq!(track.artist, "Unknown Artist");
        assert_eq!(track.duration_secs, None);
    }

    #[test]
    fn page_without_title_is_a_parse_error() {
        match extract_track("<html></html>", "xxxxxxxxxxx") {
            Err(Error::Parse(_)) => {}
            other => panic!("expected Parse error, got {other:?}"),
        }
    }

    #[test]
    fn playlist_tracks_are_extracted_in_page_order() {
        let tracks = extract_playlist_tracks(PLAYLIST_PAGE);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, "aaaaaaaaaaa");
        assert_eq!(tracks[0].title, "First Song");
        assert_eq!(tracks[0].artist, "Artist One");
        assert_eq!(tracks[0].track_number, Some(1));
        assert_eq!(tracks[1].id, "bbbbbbbbbbb");
        assert_eq!(tracks[1].artist, "Unknown Artist");
        assert_eq!(tracks[1].track_number, Some(2));
        assert_eq!(tracks[1].url, "https://www.youtube.com/watch?v=bbbbbbbbbbb");
    }

    #[test]
    fn entries_without_id_or_title_are_skipped() {
        let page = concat!(
            r#"{"playlistVideoRenderer":{"title":{"runs":[{"text":"No Id"}]}}}"#,
            r#"{"playlistVideoRenderer":{"videoId":"ccccccccccc"}}"#,
            r#"{"playlistVideoRenderer":{"videoId":"ddddddddddd","title":{"runs":[{"text":"Kept"}]}}}"#,
        );
        let tracks = extract_playlist_tracks(page);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, "ddddddddddd");
        assert_eq!(tracks[0].duration_secs, Some(0));
    }

    #[test]
    fn simple_text_titles_are_accepted() {
        let page =
            r#"{"playlistVideoRenderer":{"videoId":"eeeeeeeeeee","title":{"simpleText":"Plain"}}}"#;
        let tracks = extract_playlist_tracks(page);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].title, "Plain");
    }

    #[test]
    fn declared_count_is_read_from_page_stats() {
        let count = first_capture(&TRACK_COUNT_RE, PLAYLIST_PAGE)
            .and_then(|s| s.parse::<usize>().ok());
        assert_eq!(count, Some(2));
    }
}
