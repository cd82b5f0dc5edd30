//! # ytmusic-dl
//!
//! Download orchestration library for YouTube Music tracks and playlists.
//!
//! ## Design Philosophy
//!
//! ytmusic-dl is designed to be:
//! - **Highly configurable** - Almost every behavior can be customized
//! - **Sensible defaults** - Works out of the box with zero configuration
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Extensible** - Middleware wraps the pipeline, plugins observe it
//!
//! ## Quick Start
//!
//! ```no_run
//! use ytmusic_dl::{AudioFormat, AudioQuality, Config, MusicDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         output_dir: "./music".into(),
//!         format: AudioFormat::Mp3,
//!         quality: AudioQuality::Highest,
//!         ..Default::default()
//!     };
//!
//!     let downloader = MusicDownloader::new(config)?;
//!
//!     // Download never returns Err; inspect the result instead
//!     let result = downloader
//!         .download_track("https://music.youtube.com/watch?v=dQw4w9WgXcQ", None)
//!         .await;
//!     if result.success {
//!         println!("saved to {:?}", result.output_path);
//!     } else {
//!         eprintln!("failed: {:?}", result.error);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// Typed lifecycle event registry
pub mod events;
/// Middleware chain around the download pipeline
pub mod middleware;
/// Plugin hooks
pub mod plugin;
/// Bounded-concurrency work queue
pub mod queue;
/// Retry logic with exponential backoff
pub mod retry;
/// External collaborator seams (resolver, retriever, transcoder, tags)
pub mod services;
/// Core types and events
pub mod types;
/// URL classification and filename helpers
pub mod utils;

// Re-export commonly used types
pub use config::{
    AudioFormat, AudioQuality, Config, ConfigUpdate, NetworkConfig, NetworkUpdate,
    ProgressSink, ProxyConfig, ProxyProtocol, RetryConfig, RetryUpdate,
};
pub use downloader::MusicDownloader;
pub use error::{Error, Result};
pub use events::{EventCallback, ObserverRegistry};
pub use middleware::{Middleware, Next, Terminal};
pub use plugin::Plugin;
pub use queue::WorkQueue;
pub use services::{FetchStream, Resolver, Retriever, Services, TagWriter, Transcoder};
pub use types::{
    BatchDownloadResult, DownloadResult, Event, EventKind, PlaylistInfo, Progress,
    ProgressStatus, Stage, TrackInfo,
};
pub use utils::{UrlKind, classify_url};
