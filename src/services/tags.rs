//! Metadata tag writing via lofty

use super::TagWriter;
use crate::error::{Error, Result};
use crate::types::TrackInfo;
use async_trait::async_trait;
use lofty::config::WriteOptions;
use lofty::prelude::*;
use lofty::probe::Probe;
use lofty::tag::Tag;
use std::path::{Path, PathBuf};

/// Tag writer backed by the lofty crate
#[derive(Debug, Clone, Default)]
pub struct LoftyTagWriter;

impl LoftyTagWriter {
    /// Create a tag writer
    pub fn new() -> Self {
        Self
    }
}

fn write_tags_blocking(path: &Path, track: &TrackInfo) -> Result<()> {
    let mut tagged_file = match Probe::open(path).and_then(|probe| probe.read()) {
        Ok(file) => file,
        Err(e) => {
            // Containers lofty cannot read are skipped, not failed
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "container not taggable, skipping tag write"
            );
            return Ok(());
        }
    };

    let tag_type = tagged_file.primary_tag_type();
    if tagged_file.primary_tag().is_none() {
        tagged_file.insert_tag(Tag::new(tag_type));
    }
    let tag = match tagged_file.primary_tag_mut() {
        Some(tag) => tag,
        None => {
            tracing::warn!(path = %path.display(), "no writable tag slot, skipping tag write");
            return Ok(());
        }
    };

    tag.set_title(track.title.clone());
    tag.set_artist(track.artist.clone());
    if let Some(album) = &track.album {
        tag.set_album(album.clone());
    }
    if let Some(year) = track.year {
        tag.set_year(year);
    }
    if let Some(number) = track.track_number {
        tag.set_track(number);
    }
    if let Some(genre) = &track.genre {
        tag.set_genre(genre.clone());
    }
    if let Some(disc) = track.disc_number {
        tag.set_disk(disc);
    }

    tag.save_to_path(path, WriteOptions::default())
        .map_err(|e| Error::Tag(format!("failed to write tags to {}: {e}", path.display())))
}

#[async_trait]
impl TagWriter for LoftyTagWriter {
    async fn write_tags(&self, path: &Path, track: &TrackInfo) -> Result<()> {
        let path: PathBuf = path.to_path_buf();
        let track = track.clone();
        tokio::task::spawn_blocking(move || write_tags_blocking(&path, &track))
            .await
            .map_err(|e| Error::Tag(format!("tag writer task failed: {e}")))?
    }
}
