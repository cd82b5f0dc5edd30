//! Plugin hooks
//!
//! Plugins observe the download lifecycle through three hook points:
//! before a track is processed, after it completes, and when it fails.
//! Hooks for all registered plugins run concurrently and the pipeline
//! waits for every hook to settle before moving on. A failing hook never
//! starves the other plugins' hooks, but a before-hook failure fails the
//! track; after- and error-hook failures are logged and swallowed, and an
//! error hook never masks the primary error.

use crate::error::{Error, Result};
use crate::types::{DownloadResult, TrackInfo};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;

/// A downloader extension with optional lifecycle hooks
///
/// All hooks default to no-ops; implement only the ones you need.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique plugin name; registering a second plugin with the same name
    /// replaces the first
    fn name(&self) -> &str;

    /// Plugin version string
    fn version(&self) -> &str {
        "0.0.0"
    }

    /// One-time setup, run when the plugin is registered. A failure here
    /// rejects the registration.
    async fn init(&self) -> Result<()> {
        Ok(())
    }

    /// Runs before a track enters the middleware chain
    async fn before_download(&self, _track: &TrackInfo) -> Result<()> {
        Ok(())
    }

    /// Runs after a track finished successfully
    async fn after_download(&self, _result: &DownloadResult) -> Result<()> {
        Ok(())
    }

    /// Runs when a track failed, with the primary error
    async fn on_error(&self, _track: &TrackInfo, _error: &Error) -> Result<()> {
        Ok(())
    }
}

/// Ordered plugin collection keyed by name
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin, replacing any existing plugin with the same name.
    ///
    /// Returns `true` when an existing plugin was replaced. `init()` is the
    /// caller's responsibility (it is async and may fail before insertion).
    pub fn insert(&mut self, plugin: Arc<dyn Plugin>) -> bool {
        if let Some(slot) = self
            .plugins
            .iter_mut()
            .find(|p| p.name() == plugin.name())
        {
            *slot = plugin;
            true
        } else {
            self.plugins.push(plugin);
            false
        }
    }

    /// Remove a plugin by name, returning whether it was present
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.plugins.len();
        self.plugins.retain(|p| p.name() != name);
        self.plugins.len() != before
    }

    /// Names of the registered plugins, in registration order
    pub fn names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    /// A cheap copy of the current plugin set, for lock-free dispatch
    pub fn snapshot(&self) -> Vec<Arc<dyn Plugin>> {
        self.plugins.clone()
    }
}

/// Run every plugin's before-hook concurrently, waiting for all of them.
///
/// Every hook runs to completion even when one fails, so a broken plugin
/// cannot starve the others. The first failure is surfaced afterwards; the
/// caller fails the track on it.
pub async fn run_before_hooks(plugins: &[Arc<dyn Plugin>], track: &TrackInfo) -> Result<()> {
    let hooks = plugins.iter().map(|plugin| {
        let plugin = plugin.clone();
        async move {
            plugin.before_download(track).await.map_err(|e| {
                tracing::warn!(plugin = plugin.name(), error = %e, "before-download hook failed");
                e
            })
        }
    });
    join_all(hooks).await.into_iter().collect()
}

/// Run every plugin's after-hook concurrently, waiting for all of them
pub async fn run_after_hooks(plugins: &[Arc<dyn Plugin>], result: &DownloadResult) {
    let hooks = plugins.iter().map(|plugin| {
        let plugin = plugin.clone();
        async move {
            if let Err(e) = plugin.after_download(result).await {
                tracing::warn!(plugin = plugin.name(), error = %e, "after-download hook failed");
            }
        }
    });
    join_all(hooks).await;
}

/// Run every plugin's error-hook concurrently, waiting for all of them.
///
/// Hook failures are logged; the primary download error is preserved by
/// the caller regardless of what happens here.
pub async fn run_error_hooks(plugins: &[Arc<dyn Plugin>], track: &TrackInfo, error: &Error) {
    let hooks = plugins.iter().map(|plugin| {
        let plugin = plugin.clone();
        async move {
            if let Err(e) = plugin.on_error(track, error).await {
                tracing::warn!(plugin = plugin.name(), error = %e, "on-error hook failed");
            }
        }
    });
    join_all(hooks).await;
}
