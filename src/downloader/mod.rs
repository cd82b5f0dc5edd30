//! Core downloader implementation split into focused submodules.
//!
//! The `MusicDownloader` struct and its methods are organized by domain:
//! - [`download`] - The public download and resolve surface
//! - [`track_task`] - The per-track pipeline (check, fetch, transcode, tag, finalize)
//! - [`playlist`] - Playlist fan-out and batch aggregation
//! - [`config_ops`] - Runtime configuration updates
//! - [`extensions`] - Plugin, middleware, and event subscription management

mod config_ops;
mod download;
mod extensions;
mod playlist;
mod track_task;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::config::Config;
use crate::error::Result;
use crate::events::ObserverRegistry;
use crate::middleware::Middleware;
use crate::plugin::{Plugin, PluginRegistry};
use crate::queue::WorkQueue;
use crate::services::{
    FfmpegTranscoder, HttpRetriever, LoftyTagWriter, PageResolver, Services,
};
use crate::types::Event;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Music download orchestrator.
///
/// Owns the configuration, the bounded work queue, the middleware chain,
/// the plugin registry, and the event registry. All methods take `&self`;
/// the downloader is safe to share behind an `Arc` and drive from many
/// tasks at once.
pub struct MusicDownloader {
    pub(crate) config: RwLock<Arc<Config>>,
    pub(crate) queue: RwLock<WorkQueue>,
    pub(crate) middleware: RwLock<Vec<Arc<dyn Middleware>>>,
    pub(crate) plugins: RwLock<PluginRegistry>,
    pub(crate) events: Arc<ObserverRegistry>,
    pub(crate) services: RwLock<Services>,
    /// Whether the HTTP-backed services were built here and should be
    /// rebuilt when the network configuration changes. Injected services
    /// are never replaced.
    pub(crate) owns_http_services: bool,
}

impl MusicDownloader {
    /// Create a downloader with the production service implementations.
    ///
    /// Fails if the configuration is invalid or ffmpeg cannot be found
    /// on the PATH.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let services = Services {
            resolver: Arc::new(PageResolver::new(&config.network)?),
            retriever: Arc::new(HttpRetriever::new(&config.network)?),
            transcoder: Arc::new(FfmpegTranscoder::discover()?),
            tag_writer: Arc::new(LoftyTagWriter::new()),
        };
        Self::build(config, services, true)
    }

    /// Create a downloader with caller-provided service implementations.
    ///
    /// Injected services are kept as-is across reconfiguration.
    pub fn with_services(config: Config, services: Services) -> Result<Self> {
        config.validate()?;
        Self::build(config, services, false)
    }

    fn build(config: Config, services: Services, owns_http_services: bool) -> Result<Self> {
        let queue = WorkQueue::new(config.concurrent_downloads);
        tracing::info!(
            output_dir = %config.output_dir.display(),
            format = ?config.format,
            concurrent_downloads = config.concurrent_downloads,
            "downloader created"
        );
        Ok(Self {
            config: RwLock::new(Arc::new(config)),
            queue: RwLock::new(queue),
            middleware: RwLock::new(Vec::new()),
            plugins: RwLock::new(PluginRegistry::new()),
            events: Arc::new(ObserverRegistry::new()),
            services: RwLock::new(services),
            owns_http_services,
        })
    }

    /// Deliver an event to subscribers
    pub(crate) fn emit(&self, event: Event) {
        self.events.emit(&event);
    }

    /// Snapshot everything a spawned track task needs.
    ///
    /// Per-call overrides are merged and validated here; the downloader's
    /// own configuration is untouched.
    pub(crate) async fn task_context(
        &self,
        overrides: Option<&crate::config::ConfigUpdate>,
    ) -> Result<Arc<TaskContext>> {
        let base = self.config.read().await.clone();
        let config = match overrides {
            Some(update) => {
                let merged = base.merged(update);
                merged.validate()?;
                Arc::new(merged)
            }
            None => base,
        };
        Ok(Arc::new(TaskContext {
            config,
            services: self.services.read().await.clone(),
            middleware: self.middleware.read().await.clone(),
            plugins: self.plugins.read().await.snapshot(),
            events: self.events.clone(),
        }))
    }
}

impl std::fmt::Debug for MusicDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MusicDownloader").finish_non_exhaustive()
    }
}

/// Immutable snapshot handed to a single track task.
///
/// Config changes made while a task is running do not affect it; the task
/// sees the configuration that was current when it was submitted.
pub(crate) struct TaskContext {
    pub(crate) config: Arc<Config>,
    pub(crate) services: Services,
    pub(crate) middleware: Vec<Arc<dyn Middleware>>,
    pub(crate) plugins: Vec<Arc<dyn Plugin>>,
    pub(crate) events: Arc<ObserverRegistry>,
}
