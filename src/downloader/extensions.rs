//! Plugin, middleware, and event subscription management

use super::MusicDownloader;
use crate::error::Result;
use crate::events::EventCallback;
use crate::middleware::Middleware;
use crate::plugin::Plugin;
use crate::types::{Event, EventKind};
use std::sync::Arc;

impl MusicDownloader {
    /// Register a plugin.
    ///
    /// Runs the plugin's `init` hook first; if it fails the plugin is not
    /// registered. A plugin with the same name replaces the existing one
    /// in place.
    pub async fn add_plugin(&self, plugin: Arc<dyn Plugin>) -> Result<()> {
        plugin.init().await?;
        let name = plugin.name().to_string();
        let replaced = self.plugins.write().await.insert(plugin);
        tracing::info!(plugin = %name, replaced, "plugin registered");
        self.emit(Event::PluginAdded { name });
        Ok(())
    }

    /// Remove a plugin by name, returning whether it was registered
    pub async fn remove_plugin(&self, name: &str) -> bool {
        let removed = self.plugins.write().await.remove(name);
        if removed {
            tracing::info!(plugin = %name, "plugin removed");
            self.emit(Event::PluginRemoved {
                name: name.to_string(),
            });
        }
        removed
    }

    /// Names of the registered plugins, in registration order
    pub async fn plugin_names(&self) -> Vec<String> {
        self.plugins.read().await.names()
    }

    /// Append a middleware layer to the chain.
    ///
    /// The first layer added is outermost: it sees every download first
    /// and its result last.
    pub async fn use_middleware(&self, layer: Arc<dyn Middleware>) {
        self.middleware.write().await.push(layer);
    }

    /// Subscribe a callback to one event kind
    pub fn subscribe(&self, kind: EventKind, callback: EventCallback) {
        self.events.subscribe(kind, callback);
    }
}
