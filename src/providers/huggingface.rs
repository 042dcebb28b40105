use async_trait::async_trait;
use log::{debug, error};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::language_utils;
use crate::providers::Translator;
use crate::translation::chunker::{SEGMENT_SEPARATOR, SEPARATOR_TOKEN};

/// Client for the hosted NLLB translator
#[derive(Debug, Clone)]
pub struct HuggingFace {
    /// HTTP client for API requests
    client: Client,
    /// Full URL of the translate endpoint
    endpoint: String,
}

/// Translate request body
#[derive(Debug, Serialize)]
pub struct HuggingFaceRequest<'a> {
    /// Text to translate
    pub text: &'a str,
    /// NLLB source language code
    pub src_lang: &'a str,
    /// NLLB target language code
    pub tgt_lang: &'a str,
}

/// Translate response body
#[derive(Debug, Deserialize)]
pub struct HuggingFaceResponse {
    /// The translated text
    pub translation: String,
}

impl HuggingFace {
    /// Create a new client
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.into(),
        }
    }

    fn language_code(code: &str) -> Result<String, ProviderError> {
        language_utils::to_nllb_code(code).map_err(|e| ProviderError::UnsupportedLanguage(e.to_string()))
    }
}

/// Map a non-success HTTP status onto a provider error
pub fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    let message = format!("{}: {}", status, body.trim());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(message),
        StatusCode::REQUEST_TIMEOUT => ProviderError::Timeout(message),
        s if s.is_server_error() => ProviderError::ServerError {
            status_code: s.as_u16(),
            message: body.trim().to_string(),
        },
        _ => ProviderError::MalformedRequest(message),
    }
}

fn classify_transport(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::ConnectionError(e.to_string())
    }
}

/// Split a translated request text back into segment texts
pub fn split_translation(translation: &str) -> Vec<String> {
    translation
        .split(SEPARATOR_TOKEN)
        .map(|piece| piece.trim().to_string())
        .collect()
}

#[async_trait]
impl Translator for HuggingFace {
    async fn translate(
        &self,
        texts: &[String],
        source_language: &str,
        target_language: &str,
    ) -> Result<Vec<String>, ProviderError> {
        let src_lang = Self::language_code(source_language)?;
        let tgt_lang = Self::language_code(target_language)?;
        let text = texts.join(SEGMENT_SEPARATOR);

        let request = HuggingFaceRequest {
            text: &text,
            src_lang: &src_lang,
            tgt_lang: &tgt_lang,
        };

        debug!(
            "Sending {} segments ({} chars) to {}",
            texts.len(),
            text.chars().count(),
            self.endpoint
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_transport)?;

        if !status.is_success() {
            error!("Translator API error ({}): {}", status, body);
            return Err(classify_status(status, &body));
        }

        let parsed: HuggingFaceResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::ParseError(format!(
                "{}. Raw response (first 200 chars): {}",
                e,
                body.chars().take(200).collect::<String>()
            ))
        })?;

        Ok(split_translation(&parsed.translation))
    }

    fn name(&self) -> &str {
        "huggingface"
    }
}
