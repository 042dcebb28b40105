/*!
 * Tests for batch reassembly
 */

use std::collections::BTreeMap;

use subtitletool::errors::{PipelineError, ProviderError};
use subtitletool::translation::chunker;
use subtitletool::translation::reassembler::{self, BatchOutcome};

use crate::common;

#[test]
fn test_reassemble_withShortBatch_shouldFallBackForThatBatchOnly() {
    let segments = common::sequential_segments(4);
    let batches = chunker::chunk(&segments, 5000, 2);

    let mut outcomes: BTreeMap<usize, BatchOutcome> = BTreeMap::new();
    outcomes.insert(0, Ok(vec!["one".to_string(), "two".to_string()]));
    outcomes.insert(1, Ok(vec!["three".to_string()]));

    let result = reassembler::reassemble(&segments, &batches, &outcomes).unwrap();

    assert_eq!(result.segments[0].text, "one");
    assert_eq!(result.segments[3].text, segments[3].text);
    assert_eq!(result.fallbacks.len(), 1);
    assert_eq!(
        result.fallbacks[0].reason,
        PipelineError::TranslationCountMismatch {
            batch_id: 1,
            expected: 2,
            actual: 1
        }
    );
}

#[test]
fn test_reassemble_withFailedAndMissingBatches_shouldKeepOriginals() {
    let segments = common::sequential_segments(3);
    let batches = chunker::chunk(&segments, 5000, 1);

    let mut outcomes: BTreeMap<usize, BatchOutcome> = BTreeMap::new();
    outcomes.insert(
        0,
        Err(PipelineError::TranslationFailed {
            batch_id: 0,
            source: ProviderError::MalformedRequest("bad".to_string()),
        }),
    );
    outcomes.insert(1, Ok(vec!["translated".to_string()]));

    let result = reassembler::reassemble(&segments, &batches, &outcomes).unwrap();

    assert_eq!(result.segments[1].text, "translated");
    assert_eq!(result.fallbacks.len(), 2);
    assert!(matches!(
        result.fallbacks[1].reason,
        PipelineError::TranslationCancelled { batch_id: 2 }
    ));
    assert!(result.segments.iter().zip(&segments).all(|(a, b)| a.same_timing(b)));
}

#[test]
fn test_verifyPartition_withGap_shouldFail() {
    let segments = common::sequential_segments(4);
    let mut batches = chunker::chunk(&segments, 5000, 2);
    batches.remove(0);

    let result = reassembler::verify_partition(&batches, 4);

    assert!(matches!(result, Err(PipelineError::BatchPartitionInvariantViolation(_))));
}

#[test]
fn test_reassemble_withBrokenPartition_shouldError() {
    let segments = common::sequential_segments(2);
    let batches = chunker::chunk(&segments, 5000, 40);

    let result = reassembler::reassemble(&segments[..1], &batches, &BTreeMap::new());

    assert!(result.is_err());
}
