//! HTTP audio retrieval

use super::{FetchStream, Retriever, build_http_client, error_for_status};
use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use crate::types::TrackInfo;
use async_trait::async_trait;
use futures::StreamExt;

/// Streams audio bytes over HTTP
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: reqwest::Client,
}

impl HttpRetriever {
    /// Build a retriever with a client configured from `network`
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(network)?,
        })
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn fetch(&self, track: &TrackInfo) -> Result<FetchStream> {
        tracing::debug!(track_id = %track.id, url = %track.url, "opening audio stream");
        let response = self.client.get(&track.url).send().await?;
        if let Some(err) = error_for_status(&response) {
            return Err(err);
        }

        let total_bytes = response.content_length();
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(Error::Network))
            .boxed();

        Ok(FetchStream {
            total_bytes,
            stream,
        })
    }
}
