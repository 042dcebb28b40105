/*!
 * Error types for the subtitletool application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when calling a translation provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// The provider failed on its side (5xx)
    #[error("Server error: {status_code} - {message}")]
    ServerError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The provider rejected the request as malformed (4xx other than auth/rate limit)
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Language code not accepted by the provider
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),
}

impl ProviderError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_)
                | Self::ConnectionError(_)
                | Self::RateLimitExceeded(_)
                | Self::ServerError { .. }
        )
    }

    /// Whether the failure means no further request can succeed in this run
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::AuthenticationError(_))
    }
}

/// Errors raised by the timing and translation pipeline
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A segment violates one of the output invariants
    #[error("Malformed segment {index}: {reason}")]
    MalformedSegment {
        index: usize,
        reason: String,
    },

    /// Batches do not exactly cover the segment index range
    #[error("Batch partition invariant violated: {0}")]
    BatchPartitionInvariantViolation(String),

    /// The translation returned a different number of pieces than the batch holds
    #[error("Batch {batch_id}: expected {expected} translated segments, got {actual}")]
    TranslationCountMismatch {
        batch_id: usize,
        expected: usize,
        actual: usize,
    },

    /// Transient failures persisted after every retry
    #[error("Batch {batch_id}: transient failure after {attempts} attempts: {source}")]
    TranslationTransientFailure {
        batch_id: usize,
        attempts: u32,
        source: ProviderError,
    },

    /// The provider rejected our credentials
    #[error("Translation authentication failed: {0}")]
    TranslationAuthFailure(String),

    /// Any other non-retryable provider failure
    #[error("Batch {batch_id}: translation failed: {source}")]
    TranslationFailed {
        batch_id: usize,
        source: ProviderError,
    },

    /// The batch was not translated because the run was cancelled
    #[error("Batch {batch_id}: translation cancelled")]
    TranslationCancelled {
        batch_id: usize,
    },
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error from the subtitle database
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
