use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::PathBuf;

use crate::subtitle_writer::SubtitleFormat;
use crate::translation::retry::RetryPolicy;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language the segments are spoken in (NLLB or ISO code)
    pub source_language: String,

    /// Language to translate into (NLLB or ISO code)
    pub target_language: String,

    /// Whether segments are translated at all
    #[serde(default)]
    pub translate: bool,

    /// Timing repair settings
    #[serde(default)]
    pub timing: TimingConfig,

    /// Batch size limits imposed by the translation API
    #[serde(default)]
    pub batching: BatchConfig,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Subtitle database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Translation provider type
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProvider {
    // @provider: Hugging Face hosted NLLB translator
    #[default]
    HuggingFace,
    // @provider: Returns the text unchanged, for dry runs
    Passthrough,
}

impl TranslationProvider {
    // @returns: Capitalized provider name
    pub fn display_name(&self) -> &str {
        match self {
            Self::HuggingFace => "Hugging Face",
            Self::Passthrough => "Passthrough",
        }
    }

    // @returns: Lowercase provider identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::HuggingFace => "huggingface".to_string(),
            Self::Passthrough => "passthrough".to_string(),
        }
    }
}

// Implement Display trait for TranslationProvider
impl std::fmt::Display for TranslationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

// Implement FromStr trait for TranslationProvider
impl std::str::FromStr for TranslationProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Self::HuggingFace),
            "passthrough" => Ok(Self::Passthrough),
            _ => Err(anyhow!("Invalid provider type: {}", s)),
        }
    }
}

/// Timing repair configuration
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct TimingConfig {
    /// Segments shorter than this are extended into following silence
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: f64,

    /// Extension never makes a segment longer than this
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: default_min_duration_secs(),
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

/// Batch limits of the translation API
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BatchConfig {
    /// Maximum characters of joined text per request
    #[serde(default = "default_max_chars_per_batch")]
    pub max_chars_per_batch: usize,

    /// Maximum segments per request
    #[serde(default = "default_max_segments_per_batch")]
    pub max_segments_per_batch: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_chars_per_batch: default_max_chars_per_batch(),
            max_segments_per_batch: default_max_segments_per_batch(),
        }
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Translation provider to use
    #[serde(default)]
    pub provider: TranslationProvider,

    /// Service URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum number of batches in flight at once
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Retry count for transient failures
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff for retries (in milliseconds), doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Upper bound for a single backoff (in milliseconds)
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: TranslationProvider::default(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            concurrent_requests: default_concurrent_requests(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl TranslationConfig {
    /// Retry policy for transient provider failures
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.retry_count,
            base_delay_ms: self.retry_backoff_ms,
            max_delay_ms: self.max_backoff_ms,
        }
    }
}

/// Output configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    /// Subtitle files to write
    #[serde(default = "default_formats")]
    pub formats: Vec<SubtitleFormat>,

    /// Also write the cue list consumed by the video compositor
    #[serde(default)]
    pub write_cues: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            formats: default_formats(),
            write_cues: false,
        }
    }
}

/// Subtitle database configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// Store every processed subtitle sequence
    #[serde(default)]
    pub enabled: bool,

    /// Database file, defaults to the user data directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Immutable settings threaded through one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub source_language: String,
    pub target_language: String,
    pub timing: TimingConfig,
    pub batching: BatchConfig,
    pub concurrent_requests: usize,
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Config::default().pipeline_config()
    }
}

fn default_min_duration_secs() -> f64 {
    0.3
}

fn default_max_duration_secs() -> f64 {
    10.0
}

fn default_max_chars_per_batch() -> usize {
    5000
}

fn default_max_segments_per_batch() -> usize {
    40
}

fn default_endpoint() -> String {
    "https://saeidseyfi-hf-translator.hf.space/translate".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_concurrent_requests() -> usize {
    4
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_formats() -> Vec<SubtitleFormat> {
    vec![SubtitleFormat::Srt]
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        crate::language_utils::to_nllb_code(&self.source_language)?;
        crate::language_utils::to_nllb_code(&self.target_language)?;

        let timing = &self.timing;
        if !(timing.min_duration_secs.is_finite() && timing.min_duration_secs > 0.0) {
            return Err(anyhow!("Minimum duration must be positive, got {}", timing.min_duration_secs));
        }
        if !(timing.max_duration_secs.is_finite() && timing.max_duration_secs >= timing.min_duration_secs) {
            return Err(anyhow!(
                "Maximum duration {} must not be below the minimum duration {}",
                timing.max_duration_secs, timing.min_duration_secs
            ));
        }

        if self.batching.max_chars_per_batch == 0 {
            return Err(anyhow!("max_chars_per_batch must be greater than zero"));
        }
        if self.batching.max_segments_per_batch == 0 {
            return Err(anyhow!("max_segments_per_batch must be greater than zero"));
        }
        if self.translation.concurrent_requests == 0 {
            return Err(anyhow!("concurrent_requests must be greater than zero"));
        }

        if self.translate && self.translation.provider == TranslationProvider::HuggingFace {
            url::Url::parse(&self.translation.endpoint)
                .map_err(|e| anyhow!("Invalid translation endpoint '{}': {}", self.translation.endpoint, e))?;
        }

        if self.output.formats.is_empty() && !self.output.write_cues {
            return Err(anyhow!("No output format configured"));
        }

        Ok(())
    }

    /// Settings for one pipeline run
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            source_language: self.source_language.clone(),
            target_language: self.target_language.clone(),
            timing: self.timing,
            batching: self.batching,
            concurrent_requests: self.translation.concurrent_requests,
            retry: self.translation.retry_policy(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "eng_Latn".to_string(),
            target_language: "pes_Arab".to_string(),
            translate: false,
            timing: TimingConfig::default(),
            batching: BatchConfig::default(),
            translation: TranslationConfig::default(),
            output: OutputConfig::default(),
            database: DatabaseConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
