//! Playlist fan-out and batch aggregation
//!
//! Every member track goes through the bounded work queue; results come
//! back in playlist order and the batch counts always add up: one result
//! per member, `successful + failed == total`.

use super::MusicDownloader;
use super::download::process_track;
use crate::config::ConfigUpdate;
use crate::error::Error;
use crate::types::{BatchDownloadResult, DownloadResult};
use crate::utils::{UrlKind, classify_url};
use std::time::Instant;

impl MusicDownloader {
    /// Download every track in a playlist.
    ///
    /// Never returns an error: if the playlist itself cannot be resolved
    /// the batch records one failure and no attempts; otherwise each member
    /// track gets its own result, in playlist order, no matter how it fared.
    pub async fn download_playlist(
        &self,
        url: &str,
        options: Option<ConfigUpdate>,
    ) -> BatchDownloadResult {
        let started = Instant::now();

        if classify_url(url) != UrlKind::Playlist {
            let error = Error::InvalidUrl(format!("not a playlist URL: {url}"));
            tracing::warn!(%url, error = %error, "playlist download rejected");
            return BatchDownloadResult::resolution_failure(&error, started.elapsed());
        }

        let context = match self.task_context(options.as_ref()).await {
            Ok(context) => context,
            Err(error) => {
                tracing::warn!(%url, error = %error, "invalid per-call options");
                return BatchDownloadResult::resolution_failure(&error, started.elapsed());
            }
        };

        let playlist = match context.services.resolver.resolve_playlist(url).await {
            Ok(playlist) => playlist,
            Err(error) => {
                tracing::warn!(%url, error = %error, "playlist resolution failed");
                return BatchDownloadResult::resolution_failure(&error, started.elapsed());
            }
        };
        // A count mismatch means partial resolution; do not fan out
        if let Err(error) = playlist.validate() {
            tracing::warn!(playlist_id = %playlist.id, error = %error, "playlist rejected");
            return BatchDownloadResult::resolution_failure(&error, started.elapsed());
        }

        tracing::info!(
            playlist_id = %playlist.id,
            title = %playlist.title,
            tracks = playlist.tracks.len(),
            "playlist fan-out"
        );

        let queue = self.queue.read().await.clone();
        let handles: Vec<_> = playlist
            .tracks
            .iter()
            .map(|track| {
                let context = context.clone();
                let track = track.clone();
                queue.submit(async move { process_track(context, track).await })
            })
            .collect();

        // Awaiting in submission order keeps results in playlist order
        let mut results = Vec::with_capacity(handles.len());
        for (handle, track) in handles.into_iter().zip(playlist.tracks.iter()) {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    let error = Error::Other(format!("download task aborted: {e}"));
                    tracing::error!(track_id = %track.id, error = %error, "task join failed");
                    DownloadResult::failure(track.clone(), &error, started.elapsed())
                }
            };
            results.push(result);
        }

        let successful = results.iter().filter(|r| r.success).count();
        let failed = results.len() - successful;
        let total = results.len();

        tracing::info!(
            playlist_id = %playlist.id,
            total,
            successful,
            failed,
            elapsed_ms = started.elapsed().as_millis(),
            "playlist batch finished"
        );

        BatchDownloadResult {
            playlist: Some(playlist),
            total,
            successful,
            failed,
            results,
            elapsed: started.elapsed(),
            error: None,
        }
    }
}
