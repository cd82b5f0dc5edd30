//! Download middleware
//!
//! Middleware wraps the per-track download pipeline in an onion: the first
//! registered layer is outermost and sees the call first, the last layer
//! hands off to the pipeline itself. Each layer receives a [`Next`]
//! continuation and decides whether to call through, short-circuit with its
//! own result, or fail.
//!
//! The continuation is a plain index cursor over an immutable layer slice,
//! so a single chain traversal carries no shared mutable state and
//! concurrent downloads can traverse the same chain independently.

use crate::error::Result;
use crate::types::{DownloadResult, TrackInfo};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

/// The innermost handler a middleware chain bottoms out in
pub type Terminal =
    Arc<dyn Fn(TrackInfo) -> BoxFuture<'static, Result<DownloadResult>> + Send + Sync>;

/// A single middleware layer
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Handle a track download, calling `next.run(track)` to continue the
    /// chain. Not calling it short-circuits the chain.
    async fn handle(&self, track: TrackInfo, next: Next<'_>) -> Result<DownloadResult>;
}

/// Continuation pointing at the rest of the chain
///
/// Consumed by [`Next::run`]; a layer that drops it without running it has
/// short-circuited the download.
pub struct Next<'a> {
    layers: &'a [Arc<dyn Middleware>],
    index: usize,
    terminal: &'a Terminal,
}

impl<'a> Next<'a> {
    /// Invoke the remainder of the chain with (a possibly modified) `track`
    pub fn run(self, track: TrackInfo) -> BoxFuture<'a, Result<DownloadResult>> {
        match self.layers.get(self.index) {
            Some(layer) => {
                let layer = layer.clone();
                let next = Next {
                    layers: self.layers,
                    index: self.index + 1,
                    terminal: self.terminal,
                };
                Box::pin(async move { layer.handle(track, next).await })
            }
            None => (self.terminal)(track),
        }
    }
}

/// Run `track` through the full chain, ending in `terminal`
pub async fn run_chain(
    layers: &[Arc<dyn Middleware>],
    terminal: &Terminal,
    track: TrackInfo,
) -> Result<DownloadResult> {
    Next {
        layers,
        index: 0,
        terminal,
    }
    .run(track)
    .await
}
