/*!
 * Subtitle pipeline orchestration.
 *
 * Runs validation, then (when translating) chunking, concurrent batch
 * translation with retries, reassembly and a final invariant check. The
 * pipeline always hands back a usable subtitle sequence: batches that could
 * not be translated keep their original text.
 */

use futures::stream::{self, StreamExt};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::app_config::PipelineConfig;
use crate::errors::PipelineError;
use crate::providers::Translator;
use crate::segment::Segment;
use crate::timing::{self, ValidationOutcome, ValidationReport};

use super::chunker::{self, Batch};
use super::reassembler::{self, BatchFallback, BatchOutcome};
use super::retry::AttemptOutcome;

/// Called with `(finished_batches, total_batches)` after each batch
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Everything one pipeline run produced
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Final subtitle sequence
    pub segments: Vec<Segment>,
    /// What the timing validator changed
    pub report: ValidationReport,
    /// Number of translation batches
    pub batch_count: usize,
    /// Batches that kept their original text
    pub fallbacks: Vec<BatchFallback>,
    /// Non-fatal problems worth showing to the user
    pub warnings: Vec<String>,
    /// Set when the provider rejected our credentials
    pub auth_failure: Option<PipelineError>,
    /// Set when the caller cancelled the run
    pub cancelled: bool,
    /// Set when the translated sequence failed the final check and was replaced by the originals
    pub translation_rejected: bool,
}

impl PipelineOutput {
    /// True when every batch was translated
    pub fn fully_translated(&self) -> bool {
        self.fallbacks.is_empty() && !self.cancelled && self.auth_failure.is_none() && !self.translation_rejected
    }
}

/// One batch's translation together with its warnings
struct BatchResult {
    batch_id: usize,
    outcome: BatchOutcome,
    warnings: Vec<String>,
}

/// Timing repair and batch translation of one segment sequence
pub struct SubtitlePipeline {
    translator: Arc<dyn Translator>,
    config: PipelineConfig,
    progress: Option<ProgressCallback>,
}

impl SubtitlePipeline {
    /// Create a new pipeline
    pub fn new(translator: Arc<dyn Translator>, config: PipelineConfig) -> Self {
        Self {
            translator,
            config,
            progress: None,
        }
    }

    /// Report batch progress to `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline over raw recognizer output.
    ///
    /// Only a broken batch partition is returned as an error; every other
    /// failure is recorded on the output and the affected segments keep
    /// their original text.
    pub async fn run(
        &self,
        raw: &[Segment],
        translation_enabled: bool,
        cancel: &CancellationToken,
    ) -> Result<PipelineOutput, PipelineError> {
        let ValidationOutcome { segments, report } = timing::validate_with_report(raw, &self.config.timing);
        info!("Timing validation: {}", report);

        let mut output = PipelineOutput {
            segments,
            report,
            ..PipelineOutput::default()
        };

        if !translation_enabled || output.segments.is_empty() {
            return Ok(output);
        }

        let batching = self.config.batching;
        let batches = chunker::chunk(
            &output.segments,
            batching.max_chars_per_batch,
            batching.max_segments_per_batch,
        );
        reassembler::verify_partition(&batches, output.segments.len())?;
        output.batch_count = batches.len();

        info!(
            "Translating {} segments in {} batches with {} ({} -> {})",
            output.segments.len(),
            batches.len(),
            self.translator.name(),
            self.config.source_language,
            self.config.target_language
        );

        let start_time = Instant::now();
        let translation_token = cancel.child_token();
        let results = self.translate_batches(&batches, &translation_token).await;
        debug!("Translation finished in {:?}", start_time.elapsed());

        let mut outcomes: BTreeMap<usize, BatchOutcome> = BTreeMap::new();
        for result in results {
            output.warnings.extend(result.warnings);
            if let Err(e @ PipelineError::TranslationAuthFailure(_)) = &result.outcome {
                output.auth_failure.get_or_insert_with(|| e.clone());
            }
            outcomes.insert(result.batch_id, result.outcome);
        }

        output.cancelled = cancel.is_cancelled();
        if output.cancelled {
            warn!("Translation cancelled, untranslated batches keep their original text");
        }

        let reassembled = reassembler::reassemble(&output.segments, &batches, &outcomes)?;
        let reconciled = timing::reconcile_translated(&output.segments, &reassembled.segments);

        for index in &reconciled.restored_text {
            output
                .warnings
                .push(format!("Segment {}: empty translation, original text kept", index));
        }
        for index in &reconciled.restored_timing {
            output
                .warnings
                .push(format!("Segment {}: timing changed during translation and was restored", index));
        }

        match timing::check_invariants(&reconciled.segments) {
            Ok(()) => output.segments = reconciled.segments,
            Err(e) => {
                error!("Translated segments failed validation, keeping original text: {}", e);
                output.translation_rejected = true;
                output.warnings.push(format!("Translated segments rejected: {}", e));
            }
        }

        output.fallbacks = reassembled.fallbacks;
        if !output.fallbacks.is_empty() {
            warn!(
                "{} of {} batches kept their original text",
                output.fallbacks.len(),
                output.batch_count
            );
        }

        Ok(output)
    }

    /// Translate all batches with bounded concurrency, sorted by batch id
    async fn translate_batches(&self, batches: &[Batch], token: &CancellationToken) -> Vec<BatchResult> {
        let total = batches.len();
        let finished = AtomicUsize::new(0);
        let concurrency = self.config.concurrent_requests.max(1);

        let mut results = stream::iter(batches)
            .map(|batch| {
                let finished = &finished;
                async move {
                    let result = self.translate_batch(batch, token).await;

                    let done = finished.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(progress) = &self.progress {
                        progress(done, total);
                    }

                    match &result.outcome {
                        Ok(_) => debug!("Batch {} completed ({}/{})", batch.id, done, total),
                        Err(e) => debug!("Batch {} failed ({}/{}): {}", batch.id, done, total, e),
                    }

                    result
                }
            })
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>()
            .await;

        results.sort_by_key(|r| r.batch_id);
        results
    }

    async fn translate_batch(&self, batch: &Batch, token: &CancellationToken) -> BatchResult {
        if !batch.oversized {
            return BatchResult {
                batch_id: batch.id,
                outcome: self.translate_with_retry(batch.id, &batch.texts, token).await,
                warnings: Vec::new(),
            };
        }

        // A single segment too long for one request: translate it in pieces
        let limit = self.config.batching.max_chars_per_batch;
        let mut warnings = Vec::new();
        let mut translated = Vec::new();

        for piece in chunker::split_oversized(&batch.joined_text(), limit) {
            if piece.lossy {
                warnings.push(format!(
                    "Segment {}: text cut mid-word at {} characters",
                    batch.first_index, limit
                ));
            }

            match self.translate_with_retry(batch.id, &[piece.text], token).await {
                Ok(mut parts) if parts.len() == 1 => translated.append(&mut parts),
                Ok(parts) => {
                    return BatchResult {
                        batch_id: batch.id,
                        outcome: Err(PipelineError::TranslationCountMismatch {
                            batch_id: batch.id,
                            expected: 1,
                            actual: parts.len(),
                        }),
                        warnings,
                    };
                }
                Err(e) => {
                    return BatchResult {
                        batch_id: batch.id,
                        outcome: Err(e),
                        warnings,
                    };
                }
            }
        }

        BatchResult {
            batch_id: batch.id,
            outcome: Ok(vec![translated.join(" ")]),
            warnings,
        }
    }

    /// One request with retries for transient failures
    async fn translate_with_retry(
        &self,
        batch_id: usize,
        texts: &[String],
        token: &CancellationToken,
    ) -> BatchOutcome {
        let policy = self.config.retry;
        let cancelled = || PipelineError::TranslationCancelled { batch_id };
        let mut attempts: u32 = 0;

        loop {
            if token.is_cancelled() {
                return Err(cancelled());
            }
            attempts += 1;

            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(cancelled()),
                result = self.translator.translate(
                    texts,
                    &self.config.source_language,
                    &self.config.target_language,
                ) => AttemptOutcome::from(result),
            };

            // Results that arrive after cancellation are discarded
            if token.is_cancelled() {
                return Err(cancelled());
            }

            match outcome {
                AttemptOutcome::Success(translated) => return Ok(translated),
                AttemptOutcome::Fatal(e) if e.is_authentication() => {
                    error!("Translation provider rejected credentials, aborting translation: {}", e);
                    token.cancel();
                    return Err(PipelineError::TranslationAuthFailure(e.to_string()));
                }
                AttemptOutcome::Fatal(e) => {
                    warn!("Batch {} failed and will not be retried: {}", batch_id, e);
                    return Err(PipelineError::TranslationFailed { batch_id, source: e });
                }
                AttemptOutcome::Transient(e) => {
                    if !policy.should_retry(attempts) {
                        warn!("Batch {} failed after {} attempts: {}", batch_id, attempts, e);
                        return Err(PipelineError::TranslationTransientFailure {
                            batch_id,
                            attempts,
                            source: e,
                        });
                    }

                    let delay = policy.delay_for(attempts - 1);
                    warn!(
                        "Batch {} attempt {}/{} failed: {}, retrying in {:?}",
                        batch_id,
                        attempts,
                        policy.max_attempts(),
                        e,
                        delay
                    );

                    tokio::select! {
                        _ = token.cancelled() => return Err(cancelled()),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }
}
