//! Configuration types for ytmusic-dl
//!
//! All configuration is optional: `Config::default()` works out of the box.
//! Runtime changes go through [`ConfigUpdate`], a partial override that is
//! deep-merged onto the current configuration field by field.

use crate::error::{Error, Result};
use crate::types::Progress;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Callback invoked with throttled progress updates during a download
pub type ProgressSink = Arc<dyn Fn(Progress) + Send + Sync>;

/// Target audio container/codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    /// MPEG Layer 3
    #[default]
    Mp3,
    /// Uncompressed PCM
    Wav,
    /// Free Lossless Audio Codec
    Flac,
    /// Advanced Audio Coding
    Aac,
    /// Ogg Vorbis
    Ogg,
}

impl AudioFormat {
    /// File extension (without the leading dot) for this format
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::Flac => "flac",
            AudioFormat::Aac => "aac",
            AudioFormat::Ogg => "ogg",
        }
    }

    /// ffmpeg codec arguments for this format at the given quality
    pub fn ffmpeg_args(&self, quality: AudioQuality) -> Vec<&'static str> {
        let bitrate = quality.bitrate_arg();
        match self {
            AudioFormat::Mp3 => vec!["-codec:a", "libmp3lame", "-b:a", bitrate],
            AudioFormat::Aac => vec!["-codec:a", "aac", "-b:a", bitrate],
            AudioFormat::Ogg => vec!["-codec:a", "libvorbis", "-b:a", bitrate],
            AudioFormat::Wav => {
                let (codec, rate) = match quality {
                    AudioQuality::Lowest => ("pcm_s16le", "22050"),
                    AudioQuality::Low => ("pcm_s16le", "44100"),
                    AudioQuality::Medium => ("pcm_s24le", "48000"),
                    AudioQuality::High => ("pcm_s24le", "96000"),
                    AudioQuality::Highest => ("pcm_s32le", "192000"),
                };
                vec!["-codec:a", codec, "-ar", rate]
            }
            AudioFormat::Flac => {
                let level = match quality {
                    AudioQuality::Lowest => "0",
                    AudioQuality::Low => "3",
                    AudioQuality::Medium => "6",
                    AudioQuality::High => "8",
                    AudioQuality::Highest => "12",
                };
                vec!["-codec:a", "flac", "-compression_level", level]
            }
        }
    }
}

/// Target audio quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AudioQuality {
    /// 64 kbps
    Lowest,
    /// 128 kbps
    Low,
    /// 192 kbps
    Medium,
    /// 256 kbps
    #[default]
    High,
    /// 320 kbps
    Highest,
}

impl AudioQuality {
    /// Nominal bitrate for bitrate-based codecs, in kbps
    pub fn bitrate_kbps(&self) -> u32 {
        match self {
            AudioQuality::Lowest => 64,
            AudioQuality::Low => 128,
            AudioQuality::Medium => 192,
            AudioQuality::High => 256,
            AudioQuality::Highest => 320,
        }
    }

    fn bitrate_arg(&self) -> &'static str {
        match self {
            AudioQuality::Lowest => "64k",
            AudioQuality::Low => "128k",
            AudioQuality::Medium => "192k",
            AudioQuality::High => "256k",
            AudioQuality::Highest => "320k",
        }
    }
}

/// Proxy protocol for outbound HTTP requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProxyProtocol {
    /// Plain HTTP proxy
    #[default]
    Http,
    /// HTTPS proxy
    Https,
}

/// Outbound proxy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy host
    pub host: String,
    /// Proxy port
    pub port: u16,
    /// Proxy protocol
    #[serde(default)]
    pub protocol: ProxyProtocol,
    /// Basic-auth username, if the proxy requires authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Basic-auth password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Proxy URL in the form `protocol://host:port`
    pub fn url(&self) -> String {
        let scheme = match self.protocol {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
        };
        format!("{scheme}://{}:{}", self.host, self.port)
    }
}

/// HTTP client configuration shared by the resolver and retriever
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Per-request timeout
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Optional outbound proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,
    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
            proxy: None,
            headers: HashMap::new(),
        }
    }
}

/// Retry behavior for transient failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Initial delay before the first retry
    #[serde(default = "default_initial_delay", with = "duration_serde_ms")]
    pub initial_delay: Duration,
    /// Maximum delay between retries
    #[serde(default = "default_max_delay", with = "duration_serde_ms")]
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    /// Whether to add random jitter to retry delays
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Main configuration for [`crate::MusicDownloader`]
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory finished files are written into
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Target audio format
    #[serde(default)]
    pub format: AudioFormat,
    /// Target audio quality
    #[serde(default)]
    pub quality: AudioQuality,
    /// Whether to write metadata tags into finished files
    #[serde(default = "default_true")]
    pub write_tags: bool,
    /// Maximum number of tracks downloaded concurrently
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,
    /// Whether to re-download when the output file already exists
    #[serde(default)]
    pub overwrite: bool,
    /// Output filename template; supports `{title}`, `{artist}`, `{album}`,
    /// `{year}`, `{track_number}` and `{id}` placeholders
    #[serde(default = "default_filename_template")]
    pub filename_template: String,
    /// HTTP client settings
    #[serde(default)]
    pub network: NetworkConfig,
    /// Retry behavior for the fetch stage
    #[serde(default)]
    pub retry: RetryConfig,
    /// Progress callback, invoked at most once per 500ms per track
    #[serde(skip)]
    pub progress: Option<ProgressSink>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: AudioFormat::default(),
            quality: AudioQuality::default(),
            write_tags: true,
            concurrent_downloads: default_concurrent_downloads(),
            overwrite: false,
            filename_template: default_filename_template(),
            network: NetworkConfig::default(),
            retry: RetryConfig::default(),
            progress: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("output_dir", &self.output_dir)
            .field("format", &self.format)
            .field("quality", &self.quality)
            .field("write_tags", &self.write_tags)
            .field("concurrent_downloads", &self.concurrent_downloads)
            .field("overwrite", &self.overwrite)
            .field("filename_template", &self.filename_template)
            .field("network", &self.network)
            .field("retry", &self.retry)
            .field("progress", &self.progress.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl Config {
    /// Validate the configuration, returning the first problem found.
    ///
    /// The error names the offending key so callers can surface it directly.
    pub fn validate(&self) -> Result<()> {
        if self.concurrent_downloads == 0 {
            return Err(Error::config(
                "must be at least 1",
                "concurrent_downloads",
            ));
        }
        if self.filename_template.trim().is_empty() {
            return Err(Error::config("must not be empty", "filename_template"));
        }
        if self.network.timeout.is_zero() {
            return Err(Error::config("must be positive", "network.timeout"));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(Error::config(
                "must be at least 1.0",
                "retry.backoff_multiplier",
            ));
        }
        if self.retry.max_delay < self.retry.initial_delay {
            return Err(Error::config(
                "must be at least initial_delay",
                "retry.max_delay",
            ));
        }
        if let Some(proxy) = &self.network.proxy {
            if proxy.host.is_empty() {
                return Err(Error::config("host must not be empty", "network.proxy.host"));
            }
            if proxy.port == 0 {
                return Err(Error::config("port must not be zero", "network.proxy.port"));
            }
        }
        Ok(())
    }

    /// Apply a partial update on top of this configuration.
    ///
    /// Present fields replace, absent fields keep their current value;
    /// nested sections merge field by field. The merged result is NOT
    /// validated here, callers validate before adopting it.
    pub fn merged(&self, update: &ConfigUpdate) -> Config {
        let mut merged = self.clone();
        if let Some(output_dir) = &update.output_dir {
            merged.output_dir = output_dir.clone();
        }
        if let Some(format) = update.format {
            merged.format = format;
        }
        if let Some(quality) = update.quality {
            merged.quality = quality;
        }
        if let Some(write_tags) = update.write_tags {
            merged.write_tags = write_tags;
        }
        if let Some(concurrent) = update.concurrent_downloads {
            merged.concurrent_downloads = concurrent;
        }
        if let Some(overwrite) = update.overwrite {
            merged.overwrite = overwrite;
        }
        if let Some(template) = &update.filename_template {
            merged.filename_template = template.clone();
        }
        if let Some(network) = &update.network {
            if let Some(timeout) = network.timeout {
                merged.network.timeout = timeout;
            }
            if let Some(user_agent) = &network.user_agent {
                merged.network.user_agent = user_agent.clone();
            }
            if let Some(proxy) = &network.proxy {
                merged.network.proxy = proxy.clone();
            }
            if let Some(headers) = &network.headers {
                merged.network.headers = headers.clone();
            }
        }
        if let Some(retry) = &update.retry {
            if let Some(max_attempts) = retry.max_attempts {
                merged.retry.max_attempts = max_attempts;
            }
            if let Some(initial_delay) = retry.initial_delay {
                merged.retry.initial_delay = initial_delay;
            }
            if let Some(max_delay) = retry.max_delay {
                merged.retry.max_delay = max_delay;
            }
            if let Some(multiplier) = retry.backoff_multiplier {
                merged.retry.backoff_multiplier = multiplier;
            }
            if let Some(jitter) = retry.jitter {
                merged.retry.jitter = jitter;
            }
        }
        if let Some(progress) = &update.progress {
            merged.progress = Some(progress.clone());
        }
        merged
    }
}

/// Partial configuration override
///
/// Used both for per-call option overrides and for runtime reconfiguration
/// via [`crate::MusicDownloader::configure`]. Absent fields keep the
/// current value.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    /// New output directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    /// New target format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<AudioFormat>,
    /// New target quality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<AudioQuality>,
    /// Whether to write metadata tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_tags: Option<bool>,
    /// New concurrency cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrent_downloads: Option<usize>,
    /// Whether to overwrite existing output files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    /// New filename template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename_template: Option<String>,
    /// Network setting overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkUpdate>,
    /// Retry setting overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryUpdate>,
    /// New progress callback
    #[serde(skip)]
    pub progress: Option<ProgressSink>,
}

impl std::fmt::Debug for ConfigUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigUpdate")
            .field("output_dir", &self.output_dir)
            .field("format", &self.format)
            .field("quality", &self.quality)
            .field("write_tags", &self.write_tags)
            .field("concurrent_downloads", &self.concurrent_downloads)
            .field("overwrite", &self.overwrite)
            .field("filename_template", &self.filename_template)
            .field("network", &self.network)
            .field("retry", &self.retry)
            .field("progress", &self.progress.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Partial override for [`NetworkConfig`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkUpdate {
    /// New per-request timeout
    #[serde(
        default,
        with = "optional_duration_serde",
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout: Option<Duration>,
    /// New User-Agent header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// New proxy (Some(None) clears the proxy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<Option<ProxyConfig>>,
    /// Replacement header map
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

/// Partial override for [`RetryConfig`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryUpdate {
    /// New maximum retry attempts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
    /// New initial retry delay
    #[serde(
        default,
        with = "optional_duration_serde_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub initial_delay: Option<Duration>,
    /// New maximum retry delay
    #[serde(
        default,
        with = "optional_duration_serde_ms",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_delay: Option<Duration>,
    /// New backoff multiplier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_multiplier: Option<f64>,
    /// Whether to jitter retry delays
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jitter: Option<bool>,
}

// Default value functions for serde

fn default_output_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_concurrent_downloads() -> usize {
    3
}

fn default_filename_template() -> String {
    "{artist} - {title}".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(1000)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helpers (seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helpers (milliseconds, for sub-second retry delays)
mod duration_serde_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

mod optional_duration_serde_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}
