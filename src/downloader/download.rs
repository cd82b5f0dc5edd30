//! Public download and resolve surface
//!
//! The download methods never return an `Err`: every failure is folded into
//! the returned result object so batch callers can always count on getting
//! one result per requested item. The resolve methods do return errors, they
//! are the "inspect before downloading" surface.

use super::{MusicDownloader, TaskContext};
use crate::config::ConfigUpdate;
use crate::error::Error;
use crate::middleware::{Terminal, run_chain};
use crate::plugin::{run_after_hooks, run_before_hooks, run_error_hooks};
use crate::types::{DownloadResult, Event, PlaylistInfo, Progress, ProgressStatus, TrackInfo};
use crate::utils::{UrlKind, classify_url, extract_video_id};
use std::sync::Arc;
use std::time::Instant;

impl MusicDownloader {
    /// Download a single track.
    ///
    /// Resolution failures, invalid URLs, and invalid per-call overrides are
    /// all folded into a failure [`DownloadResult`]; this method never
    /// returns an error.
    pub async fn download_track(
        &self,
        url: &str,
        options: Option<ConfigUpdate>,
    ) -> DownloadResult {
        let started = Instant::now();

        if classify_url(url) != UrlKind::Track {
            let error = Error::InvalidUrl(format!("not a track URL: {url}"));
            tracing::warn!(%url, error = %error, "download rejected");
            return DownloadResult::failure(placeholder_track(url), &error, started.elapsed());
        }

        let context = match self.task_context(options.as_ref()).await {
            Ok(context) => context,
            Err(error) => {
                tracing::warn!(%url, error = %error, "invalid per-call options");
                return DownloadResult::failure(
                    placeholder_track(url),
                    &error,
                    started.elapsed(),
                );
            }
        };

        let track = match context.services.resolver.resolve_track(url).await {
            Ok(track) => track,
            Err(error) => {
                tracing::warn!(%url, error = %error, "track resolution failed");
                self.emit(Event::TrackFailed {
                    track: placeholder_track(url),
                    error: error.to_string(),
                });
                return DownloadResult::failure(
                    placeholder_track(url),
                    &error,
                    started.elapsed(),
                );
            }
        };

        process_track(context, track).await
    }

    /// Resolve a track URL into its metadata without downloading anything
    pub async fn resolve_track(&self, url: &str) -> crate::error::Result<TrackInfo> {
        if classify_url(url) != UrlKind::Track {
            return Err(Error::InvalidUrl(format!("not a track URL: {url}")));
        }
        let services = self.services.read().await.clone();
        services.resolver.resolve_track(url).await
    }

    /// Resolve a playlist URL into its metadata without downloading anything
    pub async fn resolve_playlist(&self, url: &str) -> crate::error::Result<PlaylistInfo> {
        if classify_url(url) != UrlKind::Playlist {
            return Err(Error::InvalidUrl(format!("not a playlist URL: {url}")));
        }
        let services = self.services.read().await.clone();
        services.resolver.resolve_playlist(url).await
    }
}

/// Run one resolved track through hooks, middleware, and the pipeline.
///
/// Never returns an error; the caller always gets a result object.
pub(crate) async fn process_track(context: Arc<TaskContext>, track: TrackInfo) -> DownloadResult {
    let started = Instant::now();
    context.events.emit(&Event::TrackStarted {
        track: track.clone(),
    });

    // A before-hook failure fails the track before the chain runs
    if let Err(error) = run_before_hooks(&context.plugins, &track).await {
        run_error_hooks(&context.plugins, &track, &error).await;
        context.events.emit(&Event::TrackFailed {
            track: track.clone(),
            error: error.to_string(),
        });
        emit_failed_progress(&context, &track.id);
        return DownloadResult::failure(track, &error, started.elapsed());
    }

    let terminal = pipeline_terminal(context.clone());
    let outcome = run_chain(&context.middleware, &terminal, track.clone()).await;

    match outcome {
        Ok(result) => {
            // After-hooks see whatever the chain produced, failure results
            // included
            run_after_hooks(&context.plugins, &result).await;
            if result.success {
                if let Some(path) = &result.output_path {
                    context.events.emit(&Event::TrackCompleted {
                        track: result.track.clone(),
                        output_path: path.clone(),
                    });
                }
                tracing::info!(
                    track_id = %result.track.id,
                    skipped = result.skipped,
                    elapsed_ms = result.elapsed.as_millis(),
                    "track finished"
                );
            } else if let Some(message) = &result.error {
                context.events.emit(&Event::TrackFailed {
                    track: result.track.clone(),
                    error: message.clone(),
                });
            }
            result
        }
        Err(error) => {
            tracing::warn!(track_id = %track.id, error = %error, "track failed");
            run_error_hooks(&context.plugins, &track, &error).await;
            context.events.emit(&Event::TrackFailed {
                track: track.clone(),
                error: error.to_string(),
            });
            emit_failed_progress(&context, &track.id);
            DownloadResult::failure(track, &error, started.elapsed())
        }
    }
}

/// Wrap the per-track pipeline as a middleware terminal
fn pipeline_terminal(context: Arc<TaskContext>) -> Terminal {
    Arc::new(move |track: TrackInfo| {
        let context = context.clone();
        Box::pin(async move { super::track_task::run_pipeline(context, track).await })
    })
}

/// Emit a terminal failure update through the configured sink, if any
fn emit_failed_progress(context: &TaskContext, track_id: &str) {
    if let Some(sink) = &context.config.progress {
        let mut progress = Progress::from_bytes(track_id, 0, None, std::time::Duration::ZERO);
        progress.status = ProgressStatus::Failed;
        sink(progress);
    }
}

/// Minimal track descriptor for failures that happen before resolution
fn placeholder_track(url: &str) -> TrackInfo {
    TrackInfo {
        id: extract_video_id(url).unwrap_or_else(|| url.to_string()),
        title: "Unknown".to_string(),
        artist: "Unknown Artist".to_string(),
        album: None,
        genre: None,
        duration_secs: None,
        year: None,
        track_number: None,
        disc_number: None,
        explicit: None,
        thumbnail: None,
        url: url.to_string(),
    }
}
