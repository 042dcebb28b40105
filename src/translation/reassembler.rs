/*!
 * Mapping batch translations back onto segments.
 *
 * Every batch is checked on its own: a batch whose translation does not
 * decompose into exactly one piece per segment keeps its original text,
 * while the other batches are applied normally. Timing is always copied
 * from the input segments.
 */

use log::warn;
use std::collections::BTreeMap;

use crate::errors::PipelineError;
use crate::segment::Segment;

use super::chunker::{Batch, SEPARATOR_TOKEN};

/// Result of translating one batch, keyed by batch id when collected
pub type BatchOutcome = Result<Vec<String>, PipelineError>;

/// A batch that kept its original text
#[derive(Debug, Clone, PartialEq)]
pub struct BatchFallback {
    pub batch_id: usize,
    pub first_index: usize,
    pub last_index: usize,
    pub reason: PipelineError,
}

/// Segments with translations applied
#[derive(Debug, Clone)]
pub struct Reassembled {
    pub segments: Vec<Segment>,
    pub fallbacks: Vec<BatchFallback>,
}

/// Check that the batches cover `[0, segment_count)` exactly once, in order
pub fn verify_partition(batches: &[Batch], segment_count: usize) -> Result<(), PipelineError> {
    let violation = |message: String| Err(PipelineError::BatchPartitionInvariantViolation(message));
    let mut expected_first = 0;

    for batch in batches {
        if batch.first_index > batch.last_index {
            return violation(format!(
                "batch {} has inverted range {}..={}",
                batch.id, batch.first_index, batch.last_index
            ));
        }
        if batch.first_index != expected_first {
            return violation(format!(
                "batch {} starts at {} but {} was expected",
                batch.id, batch.first_index, expected_first
            ));
        }
        if batch.last_index >= segment_count {
            return violation(format!(
                "batch {} ends at {} beyond the {} segments",
                batch.id, batch.last_index, segment_count
            ));
        }
        if batch.len() != batch.last_index - batch.first_index + 1 {
            return violation(format!(
                "batch {} holds {} texts for range {}..={}",
                batch.id,
                batch.len(),
                batch.first_index,
                batch.last_index
            ));
        }
        expected_first = batch.last_index + 1;
    }

    if expected_first != segment_count {
        return violation(format!(
            "batches cover {} of {} segments",
            expected_first, segment_count
        ));
    }

    Ok(())
}

/// Decompose one batch's translation into per-segment texts
pub fn reassemble_batch(batch: &Batch, translated: &[String]) -> Result<Vec<String>, PipelineError> {
    let pieces: Vec<String> = translated
        .iter()
        .flat_map(|text| text.split(SEPARATOR_TOKEN))
        .map(|piece| piece.trim().to_string())
        .collect();

    if pieces.len() != batch.len() {
        return Err(PipelineError::TranslationCountMismatch {
            batch_id: batch.id,
            expected: batch.len(),
            actual: pieces.len(),
        });
    }

    Ok(pieces)
}

/// Apply every batch outcome to a copy of `segments`.
///
/// Only a broken partition is an error. Failed, missing or mismatched
/// batches fall back to the original text and are listed in `fallbacks`.
pub fn reassemble(
    segments: &[Segment],
    batches: &[Batch],
    outcomes: &BTreeMap<usize, BatchOutcome>,
) -> Result<Reassembled, PipelineError> {
    verify_partition(batches, segments.len())?;

    let mut result = Reassembled {
        segments: segments.to_vec(),
        fallbacks: Vec::new(),
    };

    for batch in batches {
        let texts = match outcomes.get(&batch.id) {
            Some(Ok(translated)) => reassemble_batch(batch, translated),
            Some(Err(e)) => Err(e.clone()),
            None => Err(PipelineError::TranslationCancelled { batch_id: batch.id }),
        };

        match texts {
            Ok(texts) => {
                for (segment, text) in result.segments[batch.range()].iter_mut().zip(texts) {
                    segment.text = text;
                }
            }
            Err(reason) => {
                warn!(
                    "Keeping original text for segments {}..={}: {}",
                    batch.first_index, batch.last_index, reason
                );
                result.fallbacks.push(BatchFallback {
                    batch_id: batch.id,
                    first_index: batch.first_index,
                    last_index: batch.last_index,
                    reason,
                });
            }
        }
    }

    Ok(result)
}
