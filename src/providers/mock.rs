/*!
 * Mock translator implementations for testing.
 *
 * This module provides a mock translator that simulates different behaviors:
 * - `MockTranslator::identity()` - Returns every text unchanged
 * - `MockTranslator::tagging()` - Prefixes every text with the target language
 * - `MockTranslator::dropping_last()` - Returns one text fewer than it was given
 * - `MockTranslator::transient_then_working(n)` - Fails `n` times with a 503, then works
 * - `MockTranslator::auth_failure()` - Always rejects the credentials
 */

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::Translator;
use crate::translation::chunker::SEGMENT_SEPARATOR;

/// Behavior mode for the mock translator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Returns the texts unchanged
    Identity,
    /// Returns `[target] text` for every text
    Tagging,
    /// Returns the whole batch as one separator-joined string
    Joined,
    /// Returns every text but the last
    DropLast,
    /// Fails with a server error for the first `times` requests, then tags
    TransientThenWorking { times: usize },
    /// Always times out
    AlwaysTransient,
    /// Always fails authentication
    AuthFailure,
    /// Always rejects the request as malformed
    Malformed,
    /// Returns empty strings
    Empty,
}

/// Mock translator for testing pipeline behavior
#[derive(Debug, Clone)]
pub struct MockTranslator {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&[String]) -> Vec<String>>,
    /// Per-request latency chosen from the request texts (optional)
    latency: Option<fn(&[String]) -> u64>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
            latency: None,
        }
    }

    pub fn identity() -> Self {
        Self::new(MockBehavior::Identity)
    }

    pub fn tagging() -> Self {
        Self::new(MockBehavior::Tagging)
    }

    pub fn joined() -> Self {
        Self::new(MockBehavior::Joined)
    }

    pub fn dropping_last() -> Self {
        Self::new(MockBehavior::DropLast)
    }

    pub fn transient_then_working(times: usize) -> Self {
        Self::new(MockBehavior::TransientThenWorking { times })
    }

    pub fn always_transient() -> Self {
        Self::new(MockBehavior::AlwaysTransient)
    }

    pub fn auth_failure() -> Self {
        Self::new(MockBehavior::AuthFailure)
    }

    pub fn malformed() -> Self {
        Self::new(MockBehavior::Malformed)
    }

    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Set a custom response generator, used for successful requests
    pub fn with_custom_response(mut self, generator: fn(&[String]) -> Vec<String>) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Delay each request by the returned number of milliseconds
    pub fn with_latency(mut self, latency: fn(&[String]) -> u64) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    fn respond(&self, texts: &[String], target_language: &str) -> Vec<String> {
        if let Some(generator) = self.custom_response {
            return generator(texts);
        }

        match self.behavior {
            MockBehavior::Identity => texts.to_vec(),
            MockBehavior::Joined => vec![texts.join(SEGMENT_SEPARATOR)],
            MockBehavior::DropLast => texts[..texts.len().saturating_sub(1)].to_vec(),
            MockBehavior::Empty => vec![String::new(); texts.len()],
            _ => texts.iter().map(|t| format!("[{}] {}", target_language, t)).collect(),
        }
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        texts: &[String],
        _source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(Duration::from_millis(latency(texts))).await;
        }

        match self.behavior {
            MockBehavior::TransientThenWorking { times } if count < times => Err(ProviderError::ServerError {
                status_code: 503,
                message: format!("Simulated outage (request #{})", count + 1),
            }),
            MockBehavior::AlwaysTransient => Err(ProviderError::Timeout("Simulated timeout".to_string())),
            MockBehavior::AuthFailure => Err(ProviderError::AuthenticationError("Simulated bad token".to_string())),
            MockBehavior::Malformed => Err(ProviderError::MalformedRequest("Simulated 400".to_string())),
            _ => Ok(self.respond(texts, target_language)),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
