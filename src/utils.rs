//! URL classification, filename templating, and path helpers

use crate::config::AudioFormat;
use crate::types::TrackInfo;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)]
static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?youtube\.com/watch\?v=([a-zA-Z0-9_-]+)").unwrap()
});
#[allow(clippy::unwrap_used)]
static SHORT_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://youtu\.be/([a-zA-Z0-9_-]+)").unwrap()
});
#[allow(clippy::unwrap_used)]
static EMBED_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?youtube\.com/embed/([a-zA-Z0-9_-]+)").unwrap()
});
#[allow(clippy::unwrap_used)]
static MUSIC_VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://music\.youtube\.com/watch\?v=([a-zA-Z0-9_-]+)").unwrap()
});
#[allow(clippy::unwrap_used)]
static PLAYLIST_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?youtube\.com/playlist\?list=([a-zA-Z0-9_-]+)").unwrap()
});
#[allow(clippy::unwrap_used)]
static MUSIC_PLAYLIST_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://music\.youtube\.com/playlist\?list=([a-zA-Z0-9_-]+)").unwrap()
});
#[allow(clippy::unwrap_used)]
static MUSIC_ALBUM_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://music\.youtube\.com/browse/([a-zA-Z0-9_-]+)").unwrap()
});

/// What kind of resource a URL points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    /// A single track (watch, short, embed, or music watch URL)
    Track,
    /// A playlist
    Playlist,
    /// An album browse page
    Album,
    /// Not a recognized YouTube URL
    Unknown,
}

/// Classify a URL as a track, playlist, or album URL
pub fn classify_url(url: &str) -> UrlKind {
    if VIDEO_URL.is_match(url)
        || SHORT_URL.is_match(url)
        || EMBED_URL.is_match(url)
        || MUSIC_VIDEO_URL.is_match(url)
    {
        UrlKind::Track
    } else if PLAYLIST_URL.is_match(url) || MUSIC_PLAYLIST_URL.is_match(url) {
        UrlKind::Playlist
    } else if MUSIC_ALBUM_URL.is_match(url) {
        UrlKind::Album
    } else {
        UrlKind::Unknown
    }
}

/// Extract the video ID from any recognized track URL shape
pub fn extract_video_id(url: &str) -> Option<String> {
    for pattern in [&*VIDEO_URL, &*SHORT_URL, &*EMBED_URL, &*MUSIC_VIDEO_URL] {
        if let Some(captures) = pattern.captures(url) {
            return captures.get(1).map(|m| m.as_str().to_string());
        }
    }
    None
}

/// Extract the playlist ID from a playlist URL
pub fn extract_playlist_id(url: &str) -> Option<String> {
    for pattern in [&*PLAYLIST_URL, &*MUSIC_PLAYLIST_URL] {
        if let Some(captures) = pattern.captures(url) {
            return captures.get(1).map(|m| m.as_str().to_string());
        }
    }
    None
}

/// Expand the filename template with a track's metadata.
///
/// Supported placeholders: `{title}`, `{artist}`, `{album}`, `{year}`,
/// `{track_number}`, `{id}`. Missing optional fields expand to
/// placeholder-appropriate defaults, matching what resolvers leave unset.
pub fn format_filename(track: &TrackInfo, template: &str) -> String {
    template
        .replace("{title}", &track.title)
        .replace("{artist}", &track.artist)
        .replace("{album}", track.album.as_deref().unwrap_or("Unknown Album"))
        .replace(
            "{year}",
            &track.year.map_or_else(|| "Unknown".to_string(), |y| y.to_string()),
        )
        .replace(
            "{track_number}",
            &track.track_number.unwrap_or(1).to_string(),
        )
        .replace("{id}", &track.id)
}

/// Replace filesystem-hostile characters so the name is safe on all
/// platforms, and cap the length for FAT/NTFS compatibility.
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '?' | '%' | '*' | ':' | '|' | '"' | '<' | '>' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = sanitized.trim().trim_matches('.');
    let mut result: String = trimmed.chars().take(200).collect();
    if result.is_empty() {
        result.push('_');
    }
    result
}

/// Compute the final output path for a track
pub fn output_file_path(
    output_dir: &Path,
    track: &TrackInfo,
    template: &str,
    format: AudioFormat,
) -> PathBuf {
    let name = sanitize_filename(&format_filename(track, template));
    output_dir.join(format!("{name}.{}", format.extension()))
}

/// Temp-file path used while a track is being assembled
pub fn temp_file_path(output_path: &Path) -> PathBuf {
    let mut os_string = output_path.as_os_str().to_os_string();
    os_string.push(".tmp");
    PathBuf::from(os_string)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> TrackInfo {
        TrackInfo {
            id: "dQw4w9WgXcQ".into(),
            title: "Never Gonna Give You Up".into(),
            artist: "Rick Astley".into(),
            album: Some("Whenever You Need Somebody".into()),
            genre: None,
            duration_secs: Some(213),
            year: Some(1987),
            track_number: Some(1),
            disc_number: None,
            explicit: None,
            thumbnail: None,
            url: "https://music.youtube.com/watch?v=dQw4w9WgXcQ".into(),
        }
    }

    // -----------------------------------------------------------------------
    // URL classification
    // -----------------------------------------------------------------------

    #[test]
    fn classifies_track_urls() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ",
        ] {
            assert_eq!(classify_url(url), UrlKind::Track, "url: {url}");
        }
    }

    #[test]
    fn classifies_playlist_urls() {
        for url in [
            "https://www.youtube.com/playlist?list=PLabc123",
            "https://music.youtube.com/playlist?list=PLabc123",
        ] {
            assert_eq!(classify_url(url), UrlKind::Playlist, "url: {url}");
        }
    }

    #[test]
    fn classifies_album_urls() {
        let url = "https://music.youtube.com/browse/MPREb_abc123";
        assert_eq!(classify_url(url), UrlKind::Album);
    }

    #[test]
    fn classifies_garbage_as_unknown() {
        for url in [
            "https://example.com/watch?v=abc",
            "not a url at all",
            "",
            "ftp://youtube.com/watch?v=abc",
        ] {
            assert_eq!(classify_url(url), UrlKind::Unknown, "url: {url}");
        }
    }

    // -----------------------------------------------------------------------
    // ID extraction
    // -----------------------------------------------------------------------

    #[test]
    fn extracts_video_id_from_all_track_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ",
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ",
        ] {
            assert_eq!(extract_video_id(url).as_deref(), Some("dQw4w9WgXcQ"));
        }
        assert_eq!(extract_video_id("https://example.com/x"), None);
    }

    #[test]
    fn extracts_playlist_id() {
        assert_eq!(
            extract_playlist_id("https://music.youtube.com/playlist?list=PLxyz").as_deref(),
            Some("PLxyz")
        );
        assert_eq!(
            extract_playlist_id("https://music.youtube.com/watch?v=abc"),
            None
        );
    }

    // -----------------------------------------------------------------------
    // Filename templating and sanitisation
    // -----------------------------------------------------------------------

    #[test]
    fn default_template_expands_artist_and_title() {
        let name = format_filename(&track(), "{artist} - {title}");
        assert_eq!(name, "Rick Astley - Never Gonna Give You Up");
    }

    #[test]
    fn template_expands_every_placeholder() {
        let name = format_filename(&track(), "{track_number}. {title} ({album}, {year}) [{id}]");
        assert_eq!(
            name,
            "1. Never Gonna Give You Up (Whenever You Need Somebody, 1987) [dQw4w9WgXcQ]"
        );
    }

    #[test]
    fn missing_optional_fields_expand_to_defaults() {
        let mut t = track();
        t.album = None;
        t.year = None;
        t.track_number = None;
        let name = format_filename(&t, "{album} {year} {track_number}");
        assert_eq!(name, "Unknown Album Unknown 1");
    }

    #[test]
    fn sanitize_replaces_hostile_characters() {
        assert_eq!(sanitize_filename("AC/DC: Back\\in|Black?"), "AC_DC_ Back_in_Black_");
    }

    #[test]
    fn sanitize_trims_and_never_returns_empty() {
        assert_eq!(sanitize_filename("  .. "), "_");
        assert_eq!(sanitize_filename("normal name"), "normal name");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_filename(&long).chars().count(), 200);
    }

    // -----------------------------------------------------------------------
    // Path computation
    // -----------------------------------------------------------------------

    #[test]
    fn output_path_joins_dir_template_and_extension() {
        let path = output_file_path(
            Path::new("/music"),
            &track(),
            "{artist} - {title}",
            AudioFormat::Flac,
        );
        assert_eq!(
            path,
            Path::new("/music/Rick Astley - Never Gonna Give You Up.flac")
        );
    }

    #[test]
    fn temp_path_appends_tmp_suffix() {
        let path = temp_file_path(Path::new("/music/song.mp3"));
        assert_eq!(path, Path::new("/music/song.mp3.tmp"));
    }
}
