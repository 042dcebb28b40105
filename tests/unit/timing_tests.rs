/*!
 * Tests for timing validation
 */

use rand::rngs::StdRng;
use rand::SeedableRng;

use subtitletool::app_config::TimingConfig;
use subtitletool::segment::Segment;
use subtitletool::timing::{self, AdjustmentKind};

use crate::common;

#[test]
fn test_validate_withRandomInput_shouldAlwaysSatisfyInvariants() {
    let mut rng = StdRng::seed_from_u64(7);
    let config = TimingConfig::default();

    for _ in 0..500 {
        let raw = common::random_raw_segments(&mut rng, 25);

        let out = timing::validate(&raw, &config);

        assert!(timing::check_invariants(&out).is_ok(), "invalid output for {:?}", raw);
        assert!(out.len() <= raw.len());
        assert!(out.windows(2).all(|w| w[0].start <= w[1].start));
    }
}

#[test]
fn test_validateTwice_shouldChangeNothing() {
    let mut rng = StdRng::seed_from_u64(11);
    let config = TimingConfig::default();

    for _ in 0..200 {
        let raw = common::random_raw_segments(&mut rng, 20);

        let once = timing::validate(&raw, &config);
        let twice = timing::validate_with_report(&once, &config);

        assert_eq!(twice.segments, once);
        assert!(twice.report.is_clean());
    }
}

#[test]
fn test_validate_withOverlap_shouldMatchDocumentedExample() {
    let raw = vec![Segment::new(0, 0.0, 2.0, "Hello"), Segment::new(1, 1.9, 3.0, "world")];

    let out = timing::validate(&raw, &TimingConfig::default());

    assert_eq!(out, vec![Segment::new(0, 0.0, 1.9, "Hello"), Segment::new(1, 1.9, 3.0, "world")]);
}

#[test]
fn test_validate_withEmptyFirstSegment_shouldDropIt() {
    let raw = vec![Segment::new(0, 0.0, 5.0, ""), Segment::new(1, 5.0, 6.0, "ok")];

    let out = timing::validate(&raw, &TimingConfig::default());

    assert_eq!(out, vec![Segment::new(0, 5.0, 6.0, "ok")]);
}

#[test]
fn test_validate_withEmptyInput_shouldReturnEmpty() {
    let outcome = timing::validate_with_report(&[], &TimingConfig::default());

    assert!(outcome.segments.is_empty());
    assert_eq!(outcome.report.input_count, 0);
}

#[test]
fn test_validate_withShortSegment_shouldExtendIntoSilence() {
    let raw = vec![Segment::new(0, 1.0, 1.1, "Hi"), Segment::new(1, 5.0, 6.0, "there")];

    let outcome = timing::validate_with_report(&raw, &TimingConfig::default());

    assert!((outcome.segments[0].end - 1.3).abs() < 1e-9);
    assert_eq!(outcome.report.extended(), vec![0]);
}

#[test]
fn test_validate_withShortSegment_shouldStopAtNextStart() {
    let raw = vec![Segment::new(0, 1.0, 1.1, "Hi"), Segment::new(1, 1.2, 2.0, "there")];

    let out = timing::validate(&raw, &TimingConfig::default());

    assert_eq!(out[0].end, 1.2);
    assert_eq!(out[1].start, 1.2);
}

#[test]
fn test_validate_withIdenticalStarts_shouldPushSecondSegment() {
    let raw = vec![Segment::new(0, 2.0, 4.0, "first"), Segment::new(1, 2.0, 3.0, "second")];

    let outcome = timing::validate_with_report(&raw, &TimingConfig::default());

    assert!(timing::check_invariants(&outcome.segments).is_ok());
    assert_eq!(outcome.segments.len(), 2);
    assert!(outcome
        .report
        .adjustments
        .iter()
        .any(|a| matches!(a.kind, AdjustmentKind::PushedStart { .. })));
}

#[test]
fn test_validate_shouldTrimTextAndKeepConfidence() {
    let raw = vec![Segment::new(0, 0.0, 1.0, "  padded  ").with_confidence(0.8)];

    let out = timing::validate(&raw, &TimingConfig::default());

    assert_eq!(out[0].text, "padded");
    assert_eq!(out[0].confidence, Some(0.8));
}

#[test]
fn test_reconcile_withEmptyTranslation_shouldKeepOriginalText() {
    let originals = common::sequential_segments(2);
    let mut translated = originals.clone();
    translated[1].text = " ".to_string();

    let reconciled = timing::reconcile_translated(&originals, &translated);

    assert_eq!(reconciled.segments[1].text, originals[1].text);
    assert_eq!(reconciled.restored_text, vec![1]);
    assert!(timing::check_invariants(&reconciled.segments).is_ok());
}
