//! Core types for ytmusic-dl
//!
//! Contains the track and playlist descriptors, download results, progress
//! reporting types, the pipeline stage enum, and lifecycle events.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Resolved metadata for a single track
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackInfo {
    /// Stable video identifier
    pub id: String,
    /// Track title
    pub title: String,
    /// Primary artist
    pub artist: String,
    /// Album name, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Genre, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    /// Track duration in seconds, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
    /// Release year, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// Position within an album or playlist, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,
    /// Disc number within a multi-disc release, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disc_number: Option<u32>,
    /// Whether the track is marked explicit, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit: Option<bool>,
    /// Thumbnail image URL, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Canonical track URL
    pub url: String,
}

/// Resolved metadata for a playlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaylistInfo {
    /// Stable playlist identifier
    pub id: String,
    /// Playlist title
    pub title: String,
    /// Playlist description, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared number of tracks
    pub track_count: usize,
    /// The member tracks, in playlist order
    pub tracks: Vec<TrackInfo>,
    /// Canonical playlist URL
    pub url: String,
}

impl PlaylistInfo {
    /// Check that the declared track count matches the member list.
    ///
    /// A mismatch means the resolution was partial or corrupt, so the
    /// playlist must not be fanned out for download.
    pub fn validate(&self) -> Result<()> {
        if self.tracks.len() != self.track_count {
            return Err(Error::Parse(format!(
                "playlist '{}' declares {} tracks but resolved {}",
                self.id,
                self.track_count,
                self.tracks.len()
            )));
        }
        Ok(())
    }
}

/// Outcome of downloading a single track
///
/// `success == true` implies `output_path` is set and `error` is `None`;
/// `success == false` implies the reverse. This never carries an `Err` out
/// of the public download surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadResult {
    /// Whether the track reached the finalized state
    pub success: bool,
    /// The track this result is for
    pub track: TrackInfo,
    /// Where the finished file lives (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// What went wrong (present on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Size of the finished file in bytes (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Wall-clock time spent on this track
    pub elapsed: Duration,
    /// True when an existing output file was reused instead of downloading
    #[serde(default)]
    pub skipped: bool,
}

impl DownloadResult {
    /// Build a failure result for `track` from an error
    pub fn failure(track: TrackInfo, error: &Error, elapsed: Duration) -> Self {
        Self {
            success: false,
            track,
            output_path: None,
            error: Some(error.to_string()),
            file_size: None,
            elapsed,
            skipped: false,
        }
    }
}

/// Aggregated outcome of a playlist download
///
/// `successful + failed == total == results.len()` always holds, and
/// `results` preserves the playlist's track order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchDownloadResult {
    /// The playlist this batch is for, if resolution succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playlist: Option<PlaylistInfo>,
    /// Number of tracks attempted
    pub total: usize,
    /// Number of tracks that finished successfully
    pub successful: usize,
    /// Number of tracks that failed
    pub failed: usize,
    /// Per-track results in playlist order
    pub results: Vec<DownloadResult>,
    /// Wall-clock time spent on the whole batch
    pub elapsed: Duration,
    /// Batch-level error when the playlist itself could not be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchDownloadResult {
    /// Degenerate result for a playlist that could not be resolved at all:
    /// nothing was attempted, one failure is recorded at the batch level.
    pub fn resolution_failure(error: &Error, elapsed: Duration) -> Self {
        Self {
            playlist: None,
            total: 0,
            successful: 0,
            failed: 1,
            results: Vec::new(),
            elapsed,
            error: Some(error.to_string()),
        }
    }
}

/// Pipeline stage a track is in, used for progress and error context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Resolving metadata from the track page
    Resolve,
    /// Checking for an existing output file
    Check,
    /// Streaming audio bytes to the temp file
    Fetch,
    /// Converting to the target format
    Transcode,
    /// Writing metadata tags
    Tag,
    /// Renaming temp output into place
    Finalize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Resolve => "resolve",
            Stage::Check => "check",
            Stage::Fetch => "fetch",
            Stage::Transcode => "transcode",
            Stage::Tag => "tag",
            Stage::Finalize => "finalize",
        };
        write!(f, "{s}")
    }
}

/// Coarse status carried on progress updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    /// Queued, not yet started
    Pending,
    /// Bytes are being fetched
    Downloading,
    /// ffmpeg is converting the fetched audio
    Transcoding,
    /// The track reached the finalized state
    Completed,
    /// The track failed
    Failed,
}

/// A single progress update for a track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    /// The track this update is for
    pub track_id: String,
    /// Completion percentage (0.0 when the total size is unknown)
    pub percent: f64,
    /// Bytes fetched so far
    pub downloaded_bytes: u64,
    /// Total bytes expected, when the server reported a length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,
    /// Current transfer rate in bytes per second
    pub speed_bps: f64,
    /// Estimated seconds remaining, when derivable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_secs: Option<u64>,
    /// Coarse status
    pub status: ProgressStatus,
}

impl Progress {
    /// Derive a progress update from raw byte counts.
    ///
    /// Percent and ETA are only computed when the total is known.
    pub fn from_bytes(
        track_id: &str,
        downloaded: u64,
        total: Option<u64>,
        elapsed: Duration,
    ) -> Self {
        let speed_bps = if elapsed.as_secs_f64() > 0.0 {
            downloaded as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let percent = match total {
            Some(t) if t > 0 => (downloaded as f64 / t as f64) * 100.0,
            _ => 0.0,
        };
        let eta_secs = match total {
            Some(t) if speed_bps > 0.0 && t > downloaded => {
                Some(((t - downloaded) as f64 / speed_bps) as u64)
            }
            _ => None,
        };
        Self {
            track_id: track_id.to_string(),
            percent,
            downloaded_bytes: downloaded,
            total_bytes: total,
            speed_bps,
            eta_secs,
            status: ProgressStatus::Downloading,
        }
    }
}

/// Lifecycle events emitted by the downloader
///
/// Events are delivered through the typed observer registry; an event with
/// no subscribers is dropped silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A track entered the pipeline
    TrackStarted {
        /// The track being processed
        track: TrackInfo,
    },
    /// A track finished successfully (including idempotent skips)
    TrackCompleted {
        /// The track that finished
        track: TrackInfo,
        /// Where the file ended up
        output_path: PathBuf,
    },
    /// A track failed
    TrackFailed {
        /// The track that failed
        track: TrackInfo,
        /// The failure message
        error: String,
    },
    /// A plugin was registered
    PluginAdded {
        /// Plugin name
        name: String,
    },
    /// A plugin was removed
    PluginRemoved {
        /// Plugin name
        name: String,
    },
    /// Runtime configuration changed
    ConfigChanged,
}

impl Event {
    /// The kind used to route this event to subscribers
    pub fn kind(&self) -> EventKind {
        match self {
            Event::TrackStarted { .. } => EventKind::TrackStarted,
            Event::TrackCompleted { .. } => EventKind::TrackCompleted,
            Event::TrackFailed { .. } => EventKind::TrackFailed,
            Event::PluginAdded { .. } => EventKind::PluginAdded,
            Event::PluginRemoved { .. } => EventKind::PluginRemoved,
            Event::ConfigChanged => EventKind::ConfigChanged,
        }
    }
}

/// Discriminant for [`Event`], used as the subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A track entered the pipeline
    TrackStarted,
    /// A track finished successfully
    TrackCompleted,
    /// A track failed
    TrackFailed,
    /// A plugin was registered
    PluginAdded,
    /// A plugin was removed
    PluginRemoved,
    /// Runtime configuration changed
    ConfigChanged,
}
