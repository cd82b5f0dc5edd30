//! Per-track download pipeline
//!
//! A track moves through fixed stages: check for an existing file, fetch
//! the audio into a temp file, transcode into the target format, write
//! metadata tags, then finalize. Intermediate files are cleaned up by
//! drop-armed guards, so a failure at any stage leaves no partial output
//! behind.

use super::TaskContext;
use crate::error::{Error, Result};
use crate::retry::{retry_with_backoff, with_timeout};
use crate::types::{DownloadResult, Progress, ProgressStatus, Stage, TrackInfo};
use crate::utils::{output_file_path, temp_file_path};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;

/// Minimum interval between two progress emissions for one track
const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Removes a working file on drop unless disarmed.
///
/// Armed for the whole pipeline; disarmed only for files that are meant
/// to survive.
struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed && self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!(path = %self.path.display(), error = %e, "temp file cleanup failed");
            }
        }
    }
}

/// Execute the full pipeline for one track.
///
/// This is the terminal the middleware chain bottoms out in. Errors
/// propagate out through the chain; the caller folds them into a result.
pub(crate) async fn run_pipeline(
    context: Arc<TaskContext>,
    track: TrackInfo,
) -> Result<DownloadResult> {
    let started = Instant::now();
    let config = &context.config;
    let output = output_file_path(
        &config.output_dir,
        &track,
        &config.filename_template,
        config.format,
    );

    // Check: an existing file is reused unless overwrite is set
    if !config.overwrite && output.exists() {
        tracing::debug!(track_id = %track.id, path = %output.display(), "output exists, skipping");
        let file_size = file_size(&output, Stage::Check)?;
        emit_completed(context.as_ref(), &track.id, file_size, started.elapsed());
        return Ok(DownloadResult {
            success: true,
            track,
            output_path: Some(output),
            error: None,
            file_size: Some(file_size),
            elapsed: started.elapsed(),
            skipped: true,
        });
    }

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|e| Error::Download {
            stage: Stage::Check,
            message: format!("cannot create output directory: {e}"),
        })?;

    // Fetch: stream audio into the temp file, retrying transient failures
    // against the configured deadline. Each attempt starts the temp file
    // over from scratch.
    let raw_path = temp_file_path(&output);
    let mut raw_guard = TempFileGuard::new(raw_path.clone());
    let fetched = retry_with_backoff(&config.retry, || {
        with_timeout(
            config.network.timeout,
            fetch_to_file(context.clone(), &track, &raw_path, started),
        )
    })
    .await?;

    if let Some(sink) = &config.progress {
        let mut progress =
            Progress::from_bytes(&track.id, fetched, Some(fetched), started.elapsed());
        progress.status = ProgressStatus::Transcoding;
        sink(progress);
    }

    // Transcode into the final path; a failed conversion must not leave a
    // half-written output behind
    let mut output_guard = TempFileGuard::new(output.clone());
    context
        .services
        .transcoder
        .transcode(&raw_path, &output, config.format, config.quality)
        .await?;

    // Tag
    if config.write_tags {
        context.services.tag_writer.write_tags(&output, &track).await?;
    }

    // Finalize: drop the raw temp file, keep the output
    if let Err(e) = tokio::fs::remove_file(&raw_path).await {
        tracing::warn!(path = %raw_path.display(), error = %e, "temp file removal failed");
    }
    raw_guard.disarm();
    output_guard.disarm();

    let file_size = file_size(&output, Stage::Finalize)?;
    emit_completed(context.as_ref(), &track.id, file_size, started.elapsed());

    Ok(DownloadResult {
        success: true,
        track,
        output_path: Some(output),
        error: None,
        file_size: Some(file_size),
        elapsed: started.elapsed(),
        skipped: false,
    })
}

/// Stream the track's audio into `path`, emitting throttled progress.
///
/// Returns the number of bytes written.
async fn fetch_to_file(
    context: Arc<TaskContext>,
    track: &TrackInfo,
    path: &Path,
    started: Instant,
) -> Result<u64> {
    let fetch = context.services.retriever.fetch(track).await?;
    let total = fetch.total_bytes;
    let mut stream = fetch.stream;

    let mut file = tokio::fs::File::create(path).await.map_err(|e| Error::Download {
        stage: Stage::Fetch,
        message: format!("cannot create temp file: {e}"),
    })?;

    let mut downloaded: u64 = 0;
    let mut last_emit: Option<Instant> = None;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await.map_err(|e| Error::Download {
            stage: Stage::Fetch,
            message: format!("write failed: {e}"),
        })?;
        downloaded += chunk.len() as u64;

        if last_emit.is_none_or(|t| t.elapsed() >= PROGRESS_INTERVAL) {
            last_emit = Some(Instant::now());
            if let Some(sink) = &context.config.progress {
                sink(Progress::from_bytes(
                    &track.id,
                    downloaded,
                    total,
                    started.elapsed(),
                ));
            }
        }
    }
    file.flush().await.map_err(|e| Error::Download {
        stage: Stage::Fetch,
        message: format!("flush failed: {e}"),
    })?;

    tracing::debug!(track_id = %track.id, bytes = downloaded, "fetch complete");
    Ok(downloaded)
}

fn emit_completed(context: &TaskContext, track_id: &str, file_size: u64, elapsed: Duration) {
    if let Some(sink) = &context.config.progress {
        let mut progress = Progress::from_bytes(track_id, file_size, Some(file_size), elapsed);
        progress.status = ProgressStatus::Completed;
        sink(progress);
    }
}

fn file_size(path: &Path, stage: Stage) -> Result<u64> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| Error::Download {
            stage,
            message: format!("cannot stat {}: {e}", path.display()),
        })
}
