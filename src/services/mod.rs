//! External collaborator seams
//!
//! The pipeline talks to the outside world through four traits: metadata
//! resolution, audio retrieval, transcoding, and tag writing. Each has a
//! production implementation here and can be swapped out for testing or
//! for alternative backends.

use crate::config::{AudioFormat, AudioQuality, NetworkConfig};
use crate::error::{Error, Result};
use crate::types::{PlaylistInfo, TrackInfo};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use std::path::Path;
use std::sync::Arc;

pub mod resolver;
pub mod retriever;
pub mod tags;
pub mod transcoder;

pub use resolver::PageResolver;
pub use retriever::HttpRetriever;
pub use tags::LoftyTagWriter;
pub use transcoder::FfmpegTranscoder;

/// Resolves URLs into track and playlist descriptors
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a track URL into its metadata
    async fn resolve_track(&self, url: &str) -> Result<TrackInfo>;

    /// Resolve a playlist URL into its metadata and member tracks
    async fn resolve_playlist(&self, url: &str) -> Result<PlaylistInfo>;
}

/// An open audio byte stream plus what the server said about its size
pub struct FetchStream {
    /// Total size in bytes, when the server reported a content length
    pub total_bytes: Option<u64>,
    /// The audio bytes
    pub stream: BoxStream<'static, Result<Bytes>>,
}

impl std::fmt::Debug for FetchStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchStream")
            .field("total_bytes", &self.total_bytes)
            .finish_non_exhaustive()
    }
}

/// Retrieves the raw audio bytes for a resolved track
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Open a byte stream for the track's audio
    async fn fetch(&self, track: &TrackInfo) -> Result<FetchStream>;
}

/// Converts fetched audio into the target format
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Transcode `input` into `output` at the given format and quality
    async fn transcode(
        &self,
        input: &Path,
        output: &Path,
        format: AudioFormat,
        quality: AudioQuality,
    ) -> Result<()>;
}

/// Writes metadata tags into a finished audio file
#[async_trait]
pub trait TagWriter: Send + Sync {
    /// Write the track's metadata into the file at `path`.
    ///
    /// Unsupported containers are a warn-and-skip, not an error.
    async fn write_tags(&self, path: &Path, track: &TrackInfo) -> Result<()>;
}

/// The collaborator bundle a downloader runs with
#[derive(Clone)]
pub struct Services {
    /// Metadata resolution
    pub resolver: Arc<dyn Resolver>,
    /// Audio retrieval
    pub retriever: Arc<dyn Retriever>,
    /// Format conversion
    pub transcoder: Arc<dyn Transcoder>,
    /// Tag writing
    pub tag_writer: Arc<dyn TagWriter>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

/// Build a reqwest client from the network configuration.
///
/// Applies timeout, user agent, custom headers, and the optional proxy.
pub(crate) fn build_http_client(network: &NetworkConfig) -> Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    for (name, value) in &network.headers {
        let name = reqwest::header::HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            Error::config(format!("invalid header name '{name}': {e}"), "network.headers")
        })?;
        let value = reqwest::header::HeaderValue::from_str(value).map_err(|e| {
            Error::config(format!("invalid header value: {e}"), "network.headers")
        })?;
        headers.insert(name, value);
    }

    let mut builder = reqwest::Client::builder()
        .timeout(network.timeout)
        .user_agent(network.user_agent.clone())
        .default_headers(headers);

    if let Some(proxy_config) = &network.proxy {
        let mut proxy = reqwest::Proxy::all(proxy_config.url())?;
        if let (Some(user), Some(pass)) = (&proxy_config.username, &proxy_config.password) {
            proxy = proxy.basic_auth(user, pass);
        }
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Map a non-success HTTP status into the matching library error
pub(crate) fn error_for_status(response: &reqwest::Response) -> Option<Error> {
    let status = response.status();
    if status.is_success() {
        return None;
    }
    Some(match status.as_u16() {
        429 => {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(std::time::Duration::from_secs);
            Error::RateLimited { retry_after }
        }
        401 | 403 => Error::Auth(format!("server returned {status}")),
        _ => Error::Resolve(format!("HTTP error {status}")),
    })
}
