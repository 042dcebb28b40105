/*!
 * Tests for the subtitle pipeline: fallbacks, retries and cancellation
 */

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use subtitletool::app_config::TimingConfig;
use subtitletool::errors::PipelineError;
use subtitletool::providers::mock::MockTranslator;
use subtitletool::segment::Segment;
use subtitletool::timing;
use subtitletool::translation::{ProgressCallback, SubtitlePipeline};

use crate::common;

fn pipeline(translator: &MockTranslator, max_segments_per_batch: usize) -> SubtitlePipeline {
    common::init_test_logging();
    SubtitlePipeline::new(
        Arc::new(translator.clone()),
        common::small_batch_config(5000, max_segments_per_batch),
    )
}

#[tokio::test]
async fn test_run_withIdentityTranslator_shouldRoundTrip() {
    let translator = MockTranslator::identity();
    let raw = common::sequential_segments(12);

    let output = pipeline(&translator, 5).run(&raw, true, &CancellationToken::new()).await.unwrap();

    assert_eq!(output.segments, timing::validate(&raw, &TimingConfig::default()));
    assert_eq!(output.batch_count, 3);
    assert!(output.fully_translated());
    assert!(output.warnings.is_empty());
}

#[tokio::test]
async fn test_run_withJoinedResponse_shouldSplitPerSegment() {
    let translator = MockTranslator::joined();
    let raw = common::sequential_segments(6);

    let output = pipeline(&translator, 3).run(&raw, true, &CancellationToken::new()).await.unwrap();

    assert!(output.fully_translated());
    assert_eq!(output.segments[4].text, "Line number 4");
}

#[tokio::test]
async fn test_run_withShortResponseInOneBatch_shouldIsolateMismatch() {
    let translator = MockTranslator::tagging().with_custom_response(|texts| {
        let mut out: Vec<String> = texts.iter().map(|t| format!("T:{}", t)).collect();
        if texts.iter().any(|t| t == "Line number 2") {
            out.pop();
        }
        out
    });
    let raw = common::sequential_segments(6);

    let output = pipeline(&translator, 2).run(&raw, true, &CancellationToken::new()).await.unwrap();

    assert_eq!(output.fallbacks.len(), 1);
    assert_eq!(output.fallbacks[0].batch_id, 1);
    assert!(matches!(
        output.fallbacks[0].reason,
        PipelineError::TranslationCountMismatch { batch_id: 1, expected: 2, actual: 1 }
    ));
    assert_eq!(output.segments[1].text, "T:Line number 1");
    assert_eq!(output.segments[2].text, "Line number 2");
    assert_eq!(output.segments[3].text, "Line number 3");
    assert_eq!(output.segments[4].text, "T:Line number 4");
}

#[tokio::test]
async fn test_run_withPersistentTimeouts_shouldRetryThenFallBack() {
    let translator = MockTranslator::always_transient();
    let raw = common::sequential_segments(3);

    let output = pipeline(&translator, 40).run(&raw, true, &CancellationToken::new()).await.unwrap();

    assert_eq!(translator.request_count(), 4);
    assert!(matches!(
        output.fallbacks[0].reason,
        PipelineError::TranslationTransientFailure { attempts: 4, .. }
    ));
    assert_eq!(output.segments[0].text, "Line number 0");
}

#[tokio::test]
async fn test_run_withMalformedRequest_shouldNotRetry() {
    let translator = MockTranslator::malformed();
    let raw = common::sequential_segments(3);

    let output = pipeline(&translator, 40).run(&raw, true, &CancellationToken::new()).await.unwrap();

    assert_eq!(translator.request_count(), 1);
    assert!(matches!(output.fallbacks[0].reason, PipelineError::TranslationFailed { .. }));
    assert!(output.auth_failure.is_none());
}

#[tokio::test]
async fn test_run_withAuthFailure_shouldAbortRemainingBatches() {
    let translator = MockTranslator::auth_failure();
    let raw = common::sequential_segments(10);
    let mut config = common::small_batch_config(5000, 2);
    config.concurrent_requests = 1;
    let pipeline = SubtitlePipeline::new(Arc::new(translator.clone()), config);

    let output = pipeline.run(&raw, true, &CancellationToken::new()).await.unwrap();

    assert_eq!(translator.request_count(), 1);
    assert!(matches!(output.auth_failure, Some(PipelineError::TranslationAuthFailure(_))));
    assert_eq!(output.fallbacks.len(), 5);
    assert!(!output.cancelled);
    assert_eq!(output.segments, timing::validate(&raw, &TimingConfig::default()));
}

#[tokio::test]
async fn test_run_withCancelledToken_shouldMakeNoRequests() {
    let translator = MockTranslator::tagging();
    let raw = common::sequential_segments(4);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let output = pipeline(&translator, 2).run(&raw, true, &cancel).await.unwrap();

    assert_eq!(translator.request_count(), 0);
    assert!(output.cancelled);
    assert_eq!(output.fallbacks.len(), 2);
    assert_eq!(output.segments[0].text, "Line number 0");
}

#[tokio::test]
async fn test_runCancelledMidRequest_shouldDiscardPendingResults() {
    let translator = MockTranslator::tagging().with_latency(|_| 10_000);
    let raw = common::sequential_segments(4);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let output = tokio::time::timeout(
        Duration::from_secs(5),
        pipeline(&translator, 2).run(&raw, true, &cancel),
    )
    .await
    .expect("cancellation should end the run promptly")
    .unwrap();

    assert!(output.cancelled);
    assert!(output
        .fallbacks
        .iter()
        .all(|f| matches!(f.reason, PipelineError::TranslationCancelled { .. })));
    assert!(output.segments.iter().all(|s| !s.text.starts_with('[')));
}

#[tokio::test]
async fn test_run_withOutOfOrderCompletion_shouldKeepSegmentOrder() {
    // The first batch answers last
    let translator = MockTranslator::tagging()
        .with_latency(|texts| if texts.iter().any(|t| t == "Line number 0") { 80 } else { 5 });
    let raw = common::sequential_segments(8);

    let output = pipeline(&translator, 2).run(&raw, true, &CancellationToken::new()).await.unwrap();

    assert!(output.fully_translated());
    for (i, segment) in output.segments.iter().enumerate() {
        assert_eq!(segment.index, i);
        assert_eq!(segment.text, format!("[pes_Arab] Line number {}", i));
    }
}

#[tokio::test]
async fn test_run_shouldReportProgressPerBatch() {
    let translator = MockTranslator::tagging();
    let raw = common::sequential_segments(9);
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let callback: ProgressCallback = Arc::new(move |done, total| {
        assert!(done <= total);
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let output = pipeline(&translator, 3)
        .with_progress(callback)
        .run(&raw, true, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), output.batch_count);
    assert_eq!(output.batch_count, 3);
}

#[tokio::test]
async fn test_run_withOversizedSegment_shouldTranslateInPieces() {
    let translator = MockTranslator::tagging();
    let long_text = "word ".repeat(30);
    let raw = vec![
        Segment::new(0, 0.0, 1.0, "short"),
        Segment::new(1, 1.0, 5.0, long_text.trim()),
        Segment::new(2, 5.0, 6.0, "after"),
    ];
    let pipeline = SubtitlePipeline::new(Arc::new(translator.clone()), common::small_batch_config(40, 40));

    let output = pipeline.run(&raw, true, &CancellationToken::new()).await.unwrap();

    assert!(output.fully_translated());
    assert_eq!(output.batch_count, 3);
    assert!(output.segments[1].text.matches("[pes_Arab]").count() > 1);
    assert_eq!(output.segments[2].text, "[pes_Arab] after");
    assert!(translator.request_count() > 3);
}

#[tokio::test]
async fn test_run_withOversizedPieceMissingTranslation_shouldFallBackToOriginal() {
    let translator = MockTranslator::tagging().with_custom_response(|texts| {
        if texts[0].split_whitespace().any(|word| word == "w0") {
            Vec::new()
        } else {
            texts.iter().map(|t| format!("T:{}", t)).collect()
        }
    });
    let words: Vec<String> = (0..20).map(|i| format!("w{}", i)).collect();
    let long_text = words.join(" ");
    let raw = vec![Segment::new(0, 0.0, 5.0, long_text.as_str())];
    let pipeline = SubtitlePipeline::new(Arc::new(translator.clone()), common::small_batch_config(30, 40));

    let output = pipeline.run(&raw, true, &CancellationToken::new()).await.unwrap();

    assert!(!output.fully_translated());
    assert_eq!(output.fallbacks.len(), 1);
    assert!(matches!(
        output.fallbacks[0].reason,
        PipelineError::TranslationCountMismatch { expected: 1, actual: 0, .. }
    ));
    assert_eq!(output.segments[0].text, long_text);
}

#[tokio::test]
async fn test_run_withOversizedPieceSplitInTwo_shouldFallBackToOriginal() {
    let translator = MockTranslator::tagging()
        .with_custom_response(|texts| texts.iter().flat_map(|t| [t.clone(), t.clone()]).collect());
    let long_text = "word ".repeat(30);
    let raw = vec![Segment::new(0, 0.0, 5.0, long_text.trim())];
    let pipeline = SubtitlePipeline::new(Arc::new(translator.clone()), common::small_batch_config(40, 40));

    let output = pipeline.run(&raw, true, &CancellationToken::new()).await.unwrap();

    assert_eq!(output.fallbacks.len(), 1);
    assert_eq!(output.segments[0].text, long_text.trim());
    assert_eq!(translator.request_count(), 1);
}

#[tokio::test]
async fn test_run_withEmptyTranslations_shouldKeepOriginalText() {
    let translator = MockTranslator::empty();
    let raw = common::sequential_segments(3);

    let output = pipeline(&translator, 40).run(&raw, true, &CancellationToken::new()).await.unwrap();

    assert_eq!(output.segments.len(), 3);
    assert_eq!(output.segments[2].text, "Line number 2");
    assert_eq!(output.warnings.len(), 3);
    assert!(timing::check_invariants(&output.segments).is_ok());
}

#[tokio::test]
async fn test_run_withOnlyEmptySegments_shouldSkipTranslation() {
    let translator = MockTranslator::tagging();
    let raw = vec![Segment::new(0, 0.0, 1.0, ""), Segment::new(1, 1.0, 2.0, " ")];

    let output = pipeline(&translator, 40).run(&raw, true, &CancellationToken::new()).await.unwrap();

    assert!(output.segments.is_empty());
    assert_eq!(translator.request_count(), 0);
}
