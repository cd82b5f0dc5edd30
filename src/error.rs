//! Error types for ytmusic-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error types (Resolve, Download, Transcode, Config, etc.)
//! - Context information (pipeline stage, config key, retry-after hint)
//!
//! Retryability classification lives in [`crate::retry`].

use std::time::Duration;
use thiserror::Error;

/// Result type alias for ytmusic-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ytmusic-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "concurrent_downloads")
        key: Option<String>,
    },

    /// The given URL is not a recognized track, playlist, or album URL
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Metadata resolution failed (page fetch or extraction)
    #[error("resolve error: {0}")]
    Resolve(String),

    /// The fetched page could not be parsed into the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Download-stage error with the pipeline stage it occurred in
    #[error("download error in {stage} stage: {message}")]
    Download {
        /// Pipeline stage the error occurred in
        stage: crate::types::Stage,
        /// What went wrong
        message: String,
    },

    /// Audio transcoding failed
    #[error("transcode error: {0}")]
    Transcode(String),

    /// Tag writing failed
    #[error("tag error: {0}")]
    Tag(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The remote service signalled rate limiting
    #[error("rate limited{}", retry_after.map(|d| format!(", retry after {}s", d.as_secs())).unwrap_or_default())]
    RateLimited {
        /// Server-provided hint for when to retry, if any
        retry_after: Option<Duration>,
    },

    /// Authentication or authorization failure
    #[error("authentication error: {0}")]
    Auth(String),

    /// Operation exceeded its deadline
    #[error("operation timed out after {elapsed:?}")]
    Timeout {
        /// How long the operation ran before the deadline fired
        elapsed: Duration,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Plugin registry error (e.g., a plugin failed to initialize)
    #[error("plugin error: {0}")]
    Plugin(String),

    /// External tool execution failed (ffmpeg)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error naming the offending key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Stage;

    #[test]
    fn download_error_display_includes_stage() {
        let err = Error::Download {
            stage: Stage::Fetch,
            message: "stream interrupted".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("fetch"), "message was: {msg}");
        assert!(msg.contains("stream interrupted"));
    }

    #[test]
    fn rate_limited_display_includes_hint_when_present() {
        let err = Error::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert!(err.to_string().contains("30s"));

        let err = Error::RateLimited { retry_after: None };
        assert_eq!(err.to_string(), "rate limited");
    }

    #[test]
    fn config_helper_sets_key() {
        let err = Error::config("must be at least 1", "concurrent_downloads");
        match err {
            Error::Config { message, key } => {
                assert_eq!(message, "must be at least 1");
                assert_eq!(key.as_deref(), Some("concurrent_downloads"));
            }
            other => panic!("expected Config, got {other:?}"),
        }
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn timeout_display_includes_elapsed() {
        let err = Error::Timeout {
            elapsed: Duration::from_secs(20),
        };
        assert!(err.to_string().contains("20s"));
    }
}
