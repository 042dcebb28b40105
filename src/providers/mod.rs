/*!
 * Translation provider implementations.
 *
 * This module contains the clients the pipeline can translate with:
 * - HuggingFace: hosted NLLB translator over HTTP
 * - Passthrough: returns the text unchanged, for dry runs
 * - Mock: scriptable translator for tests
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for all translation providers
///
/// The pipeline only ever talks to this trait, so providers can be used
/// interchangeably and swapped for a mock in tests.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate a batch of texts
    ///
    /// # Arguments
    /// * `texts` - Segment texts of one batch, in order
    /// * `source_language` - Language of the texts
    /// * `target_language` - Language to translate into
    ///
    /// # Returns
    /// * `Result<Vec<String>, ProviderError>` - One translated text per input text, or an error
    async fn translate(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError>;

    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self, source_language: &str, target_language: &str) -> Result<(), ProviderError> {
        self.translate(&["Hello".to_string()], source_language, target_language)
            .await
            .map(|_| ())
    }
}

pub mod huggingface;
pub mod mock;
pub mod passthrough;
