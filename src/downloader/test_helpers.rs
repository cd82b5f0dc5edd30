//! Shared fakes and builders for downloader tests

use crate::config::Config;
use crate::error::{Error, Result};
use crate::services::{FetchStream, Resolver, Retriever, Services, TagWriter, Transcoder};
use crate::types::{PlaylistInfo, TrackInfo};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use super::MusicDownloader;

pub(crate) const TRACK_URL: &str = "https://music.youtube.com/watch?v=abcdefghijk";
pub(crate) const PLAYLIST_URL: &str = "https://music.youtube.com/playlist?list=PLtest";

pub(crate) fn test_track(id: &str) -> TrackInfo {
    TrackInfo {
        id: id.to_string(),
        title: format!("Track {id}"),
        artist: "Test Artist".to_string(),
        album: Some("Test Album".to_string()),
        genre: None,
        duration_secs: Some(180),
        year: Some(2020),
        track_number: None,
        disc_number: None,
        explicit: None,
        thumbnail: None,
        url: format!("https://music.youtube.com/watch?v={id}"),
    }
}

pub(crate) fn test_playlist(id: &str, track_ids: &[&str]) -> PlaylistInfo {
    let tracks: Vec<TrackInfo> = track_ids.iter().map(|id| test_track(id)).collect();
    PlaylistInfo {
        id: id.to_string(),
        title: format!("Playlist {id}"),
        description: None,
        track_count: tracks.len(),
        tracks,
        url: format!("https://music.youtube.com/playlist?list={id}"),
    }
}

/// Resolver that synthesizes tracks from the URL's video id and serves
/// registered playlists
#[derive(Default)]
pub(crate) struct FakeResolver {
    pub(crate) playlists: Mutex<HashMap<String, PlaylistInfo>>,
    pub(crate) fail: AtomicBool,
    pub(crate) resolve_count: AtomicUsize,
}

impl FakeResolver {
    pub(crate) fn register_playlist(&self, url: &str, playlist: PlaylistInfo) {
        self.playlists.lock().unwrap().insert(url.to_string(), playlist);
    }
}

#[async_trait]
impl Resolver for FakeResolver {
    async fn resolve_track(&self, url: &str) -> Result<TrackInfo> {
        self.resolve_count.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Resolve("resolver made to fail".into()));
        }
        let id = crate::utils::extract_video_id(url)
            .ok_or_else(|| Error::InvalidUrl(url.to_string()))?;
        Ok(test_track(&id))
    }

    async fn resolve_playlist(&self, url: &str) -> Result<PlaylistInfo> {
        self.resolve_count.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Resolve("resolver made to fail".into()));
        }
        self.playlists
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Resolve(format!("unknown playlist: {url}")))
    }
}

/// Retriever serving a fixed payload, with per-id and transient failure
/// injection
pub(crate) struct FakeRetriever {
    pub(crate) payload: Vec<u8>,
    pub(crate) fetch_count: AtomicUsize,
    pub(crate) fail_ids: Mutex<HashSet<String>>,
    /// Number of upcoming fetches that fail with a retryable error
    pub(crate) transient_failures: AtomicUsize,
    /// Called at the start of every fetch, for ordering assertions
    pub(crate) on_fetch: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
}

impl Default for FakeRetriever {
    fn default() -> Self {
        Self {
            payload: b"fake audio bytes".to_vec(),
            fetch_count: AtomicUsize::new(0),
            fail_ids: Mutex::new(HashSet::new()),
            transient_failures: AtomicUsize::new(0),
            on_fetch: Mutex::new(None),
        }
    }
}

impl FakeRetriever {
    pub(crate) fn fail_track(&self, id: &str) {
        self.fail_ids.lock().unwrap().insert(id.to_string());
    }
}

#[async_trait]
impl Retriever for FakeRetriever {
    async fn fetch(&self, track: &TrackInfo) -> Result<FetchStream> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Some(observe) = self.on_fetch.lock().unwrap().as_ref() {
            observe();
        }

        if self
            .transient_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Error::Io(std::io::Error::from(
                std::io::ErrorKind::ConnectionReset,
            )));
        }
        if self.fail_ids.lock().unwrap().contains(&track.id) {
            return Err(Error::Resolve(format!("no stream for {}", track.id)));
        }

        let total = self.payload.len() as u64;
        let chunks: Vec<Result<Bytes>> = self
            .payload
            .chunks(4)
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        Ok(FetchStream {
            total_bytes: Some(total),
            stream: futures::stream::iter(chunks).boxed(),
        })
    }
}

/// Transcoder that just copies the input file
#[derive(Default)]
pub(crate) struct FakeTranscoder {
    pub(crate) transcode_count: AtomicUsize,
    pub(crate) fail: AtomicBool,
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        _format: crate::config::AudioFormat,
        _quality: crate::config::AudioQuality,
    ) -> Result<()> {
        self.transcode_count.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::Transcode("transcoder made to fail".into()));
        }
        tokio::fs::copy(input, output).await.map_err(Error::Io)?;
        Ok(())
    }
}

/// Tag writer that records what it was asked to write
#[derive(Default)]
pub(crate) struct FakeTagWriter {
    pub(crate) tag_count: AtomicUsize,
    pub(crate) last_title: Mutex<Option<String>>,
}

#[async_trait]
impl TagWriter for FakeTagWriter {
    async fn write_tags(&self, _path: &Path, track: &TrackInfo) -> Result<()> {
        self.tag_count.fetch_add(1, Ordering::SeqCst);
        *self.last_title.lock().unwrap() = Some(track.title.clone());
        Ok(())
    }
}

/// A downloader wired to fakes, plus handles for assertions
pub(crate) struct TestHarness {
    pub(crate) downloader: MusicDownloader,
    pub(crate) resolver: Arc<FakeResolver>,
    pub(crate) retriever: Arc<FakeRetriever>,
    pub(crate) transcoder: Arc<FakeTranscoder>,
    pub(crate) tag_writer: Arc<FakeTagWriter>,
    pub(crate) _temp: tempfile::TempDir,
}

pub(crate) fn test_config(output_dir: &Path) -> Config {
    let mut config = Config {
        output_dir: output_dir.to_path_buf(),
        concurrent_downloads: 2,
        ..Default::default()
    };
    config.retry.max_attempts = 2;
    config.retry.initial_delay = Duration::from_millis(1);
    config.retry.max_delay = Duration::from_millis(5);
    config.retry.jitter = false;
    config
}

pub(crate) fn create_test_downloader() -> TestHarness {
    let temp = tempfile::tempdir().unwrap();
    create_test_downloader_with(test_config(&temp.path().join("out")), temp)
}

pub(crate) fn create_test_downloader_with(
    config: Config,
    temp: tempfile::TempDir,
) -> TestHarness {
    let resolver = Arc::new(FakeResolver::default());
    let retriever = Arc::new(FakeRetriever::default());
    let transcoder = Arc::new(FakeTranscoder::default());
    let tag_writer = Arc::new(FakeTagWriter::default());
    let services = Services {
        resolver: resolver.clone(),
        retriever: retriever.clone(),
        transcoder: transcoder.clone(),
        tag_writer: tag_writer.clone(),
    };
    let downloader = MusicDownloader::with_services(config, services).unwrap();
    TestHarness {
        downloader,
        resolver,
        retriever,
        transcoder,
        tag_writer,
        _temp: temp,
    }
}
