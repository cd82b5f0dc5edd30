//! Runtime configuration updates

use super::MusicDownloader;
use crate::config::{Config, ConfigUpdate};
use crate::error::Result;
use crate::queue::WorkQueue;
use crate::services::{HttpRetriever, PageResolver};
use crate::types::Event;
use std::sync::Arc;

impl MusicDownloader {
    /// Apply a partial configuration update.
    ///
    /// The update is deep-merged onto the current configuration and the
    /// merged result is validated before anything is swapped in; an invalid
    /// update leaves the downloader untouched. Downloads already in flight
    /// keep the configuration snapshot they started with.
    pub async fn configure(&self, update: ConfigUpdate) -> Result<()> {
        let mut current = self.config.write().await;
        let merged = current.merged(&update);
        merged.validate()?;

        let concurrency_changed = merged.concurrent_downloads != current.concurrent_downloads;
        let network_changed = merged.network != current.network;

        if concurrency_changed {
            // Replace the queue; tasks admitted under the old cap finish
            // under it, new submissions see the new cap
            *self.queue.write().await = WorkQueue::new(merged.concurrent_downloads);
            tracing::info!(
                concurrent_downloads = merged.concurrent_downloads,
                "work queue replaced"
            );
        }

        if network_changed && self.owns_http_services {
            let mut services = self.services.write().await;
            services.resolver = Arc::new(PageResolver::new(&merged.network)?);
            services.retriever = Arc::new(HttpRetriever::new(&merged.network)?);
            tracing::debug!("http services rebuilt for new network settings");
        }

        *current = Arc::new(merged);
        drop(current);

        self.emit(Event::ConfigChanged);
        Ok(())
    }

    /// A copy of the current configuration.
    ///
    /// Mutating the returned value has no effect on the downloader; changes
    /// go through [`MusicDownloader::configure`].
    pub async fn config(&self) -> Config {
        self.config.read().await.as_ref().clone()
    }
}
