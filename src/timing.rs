/*!
 * Timing repair for transcription segments.
 *
 * The validator is a total function: it never rejects input. Whatever the
 * recognizer produced, the returned sequence is ordered, has positive
 * durations, has no overlaps, has no empty text and is numbered from 0.
 * Text is cleaned up without touching timing.
 * Every change is recorded in a `ValidationReport` so it can be surfaced.
 */

use log::debug;
use std::fmt;

use crate::app_config::TimingConfig;
use crate::errors::PipelineError;
use crate::segment::Segment;
use crate::text_cleanup;

/// Durations below this are treated as zero
const MIN_DURATION_FLOOR_SECS: f64 = 0.001;

/// Timestamps past this are treated like NaN. Adding the duration floor to
/// anything below it still yields a later value.
pub const MAX_TIMESTAMP_SECS: f64 = 1.0e9;

/// What the validator did to one segment
#[derive(Debug, Clone, PartialEq)]
pub enum AdjustmentKind {
    /// Text was empty or whitespace only
    Dropped,
    /// Spacing or repeated punctuation in the text was cleaned up
    CleanedText,
    /// Start was negative, not a number or past the ceiling
    ClampedStart { from: f64 },
    /// End was negative, not a number or past the ceiling
    ClampedEnd { from: f64 },
    /// End did not come after start
    RepairedRange { old_end: f64, new_end: f64 },
    /// Start preceded the previous segment's start
    Reordered { old_start: f64, new_start: f64 },
    /// End was pulled back to remove an overlap
    ShrunkEnd { old_end: f64, new_end: f64 },
    /// Start was pushed forward to remove an overlap
    PushedStart { old_start: f64, new_start: f64 },
    /// End was extended into silence to reach the minimum duration
    Extended { old_end: f64, new_end: f64 },
}

/// A single recorded adjustment, keyed by the segment's input index
#[derive(Debug, Clone, PartialEq)]
pub struct TimingAdjustment {
    pub original_index: usize,
    pub kind: AdjustmentKind,
}

/// Diagnostics of one validation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Number of segments received
    pub input_count: usize,
    /// Number of segments returned
    pub output_count: usize,
    /// Adjustments in the order they were made
    pub adjustments: Vec<TimingAdjustment>,
}

impl ValidationReport {
    fn new(input_count: usize) -> Self {
        Self {
            input_count,
            ..Self::default()
        }
    }

    fn record(&mut self, original_index: usize, kind: AdjustmentKind) {
        debug!("Segment {}: {:?}", original_index, kind);
        self.adjustments.push(TimingAdjustment { original_index, kind });
    }

    /// Input indices of the dropped segments
    pub fn dropped(&self) -> Vec<usize> {
        self.indices_where(|kind| matches!(kind, AdjustmentKind::Dropped))
    }

    /// Input indices of segments whose end was extended
    pub fn extended(&self) -> Vec<usize> {
        self.indices_where(|kind| matches!(kind, AdjustmentKind::Extended { .. }))
    }

    /// Number of adjustments made to resolve overlaps or ordering
    pub fn overlap_repairs(&self) -> usize {
        self.adjustments
            .iter()
            .filter(|a| {
                matches!(
                    a.kind,
                    AdjustmentKind::ShrunkEnd { .. }
                        | AdjustmentKind::PushedStart { .. }
                        | AdjustmentKind::Reordered { .. }
                )
            })
            .count()
    }

    /// True when the input needed no repair at all
    pub fn is_clean(&self) -> bool {
        self.adjustments.is_empty()
    }

    fn indices_where(&self, predicate: impl Fn(&AdjustmentKind) -> bool) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .adjustments
            .iter()
            .filter(|a| predicate(&a.kind))
            .map(|a| a.original_index)
            .collect();
        indices.dedup();
        indices
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} in, {} out: {} dropped, {} overlap repairs, {} extended, {} other adjustments",
            self.input_count,
            self.output_count,
            self.dropped().len(),
            self.overlap_repairs(),
            self.extended().len(),
            self.adjustments
                .len()
                .saturating_sub(self.dropped().len() + self.overlap_repairs() + self.extended().len())
        )
    }
}

/// Validated segments together with what was done to them
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub segments: Vec<Segment>,
    pub report: ValidationReport,
}

/// Repair a raw segment sequence, discarding the report
pub fn validate(raw: &[Segment], config: &TimingConfig) -> Vec<Segment> {
    validate_with_report(raw, config).segments
}

/// Repair a raw segment sequence
pub fn validate_with_report(raw: &[Segment], config: &TimingConfig) -> ValidationOutcome {
    let min = config.min_duration_secs.max(MIN_DURATION_FLOOR_SECS);
    let max = config.max_duration_secs.max(min);
    let mut report = ValidationReport::new(raw.len());

    let mut segments = Vec::with_capacity(raw.len());
    let mut origins = Vec::with_capacity(raw.len());

    for source in raw {
        let text = source.text.trim();
        if text.is_empty() {
            report.record(source.index, AdjustmentKind::Dropped);
            continue;
        }

        let mut segment = source.clone();
        segment.text = text_cleanup::normalize(text);
        if segment.text != text {
            report.record(source.index, AdjustmentKind::CleanedText);
        }

        if !is_recognizer_timestamp(segment.start) {
            report.record(source.index, AdjustmentKind::ClampedStart { from: segment.start });
            segment.start = 0.0;
        }
        if !is_recognizer_timestamp(segment.end) {
            report.record(source.index, AdjustmentKind::ClampedEnd { from: segment.end });
            segment.end = 0.0;
        }

        if segment.end <= segment.start {
            let new_end = segment.start + min;
            report.record(
                source.index,
                AdjustmentKind::RepairedRange { old_end: segment.end, new_end },
            );
            segment.end = new_end;
        }

        origins.push(source.index);
        segments.push(segment);
    }

    resolve_overlaps(&mut segments, &origins, min, &mut report);
    extend_short_segments(&mut segments, &origins, min, max, &mut report);

    for (i, segment) in segments.iter_mut().enumerate() {
        segment.index = i;
    }

    report.output_count = segments.len();
    ValidationOutcome { segments, report }
}

fn is_valid_timestamp(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn is_recognizer_timestamp(value: f64) -> bool {
    is_valid_timestamp(value) && value <= MAX_TIMESTAMP_SECS
}

/// Walk consecutive pairs once. Each step only pulls the earlier end back or
/// pushes the later segment forward, so pairs already visited stay valid.
fn resolve_overlaps(
    segments: &mut [Segment],
    origins: &[usize],
    min: f64,
    report: &mut ValidationReport,
) {
    for i in 0..segments.len().saturating_sub(1) {
        let (head, tail) = segments.split_at_mut(i + 1);
        let current = &mut head[i];
        let next = &mut tail[0];

        if next.start < current.start {
            report.record(
                origins[i + 1],
                AdjustmentKind::Reordered { old_start: next.start, new_start: current.start },
            );
            next.start = current.start;
            if next.end <= next.start {
                let new_end = next.start + min;
                report.record(
                    origins[i + 1],
                    AdjustmentKind::RepairedRange { old_end: next.end, new_end },
                );
                next.end = new_end;
            }
        }

        if current.end <= next.start {
            continue;
        }

        if next.start - current.start >= min {
            report.record(
                origins[i],
                AdjustmentKind::ShrunkEnd { old_end: current.end, new_end: next.start },
            );
            current.end = next.start;
            continue;
        }

        // Shrinking would leave the current segment under the floor
        let boundary = (current.start + min).min(current.end).min(next.end);
        if boundary != current.end {
            report.record(
                origins[i],
                AdjustmentKind::ShrunkEnd { old_end: current.end, new_end: boundary },
            );
            current.end = boundary;
        }
        report.record(
            origins[i + 1],
            AdjustmentKind::PushedStart { old_start: next.start, new_start: boundary },
        );
        next.start = boundary;

        if next.end <= next.start {
            let new_end = next.start + min;
            report.record(
                origins[i + 1],
                AdjustmentKind::RepairedRange { old_end: next.end, new_end },
            );
            next.end = new_end;
        }
    }
}

fn extend_short_segments(
    segments: &mut [Segment],
    origins: &[usize],
    min: f64,
    max: f64,
    report: &mut ValidationReport,
) {
    for i in 0..segments.len() {
        let next_start = segments.get(i + 1).map_or(f64::INFINITY, |next| next.start);
        let segment = &mut segments[i];

        if segment.duration() >= min {
            continue;
        }

        let target = (segment.start + min).min(next_start).min(segment.start + max);
        if target > segment.end {
            report.record(
                origins[i],
                AdjustmentKind::Extended { old_end: segment.end, new_end: target },
            );
            segment.end = target;
        }
    }
}

/// Check the output invariants, reporting the first violation
pub fn check_invariants(segments: &[Segment]) -> Result<(), PipelineError> {
    for (i, segment) in segments.iter().enumerate() {
        let malformed = |reason: String| PipelineError::MalformedSegment { index: segment.index, reason };

        if segment.index != i {
            return Err(malformed(format!("expected index {}", i)));
        }
        if !is_valid_timestamp(segment.start) || !segment.end.is_finite() {
            return Err(malformed("timestamp is negative or not finite".to_string()));
        }
        if segment.end <= segment.start {
            return Err(malformed(format!(
                "end {:.3}s does not follow start {:.3}s",
                segment.end, segment.start
            )));
        }
        if segment.text.trim().is_empty() {
            return Err(malformed("empty text".to_string()));
        }
        if let Some(next) = segments.get(i + 1) {
            if segment.end > next.start {
                return Err(malformed(format!(
                    "overlaps segment {} by {:.3}s",
                    next.index,
                    segment.end - next.start
                )));
            }
        }
    }

    Ok(())
}

/// Result of checking translated segments against the validated originals
#[derive(Debug, Clone, Default)]
pub struct Reconciled {
    pub segments: Vec<Segment>,
    /// Indices whose translation was empty and fell back to the original text
    pub restored_text: Vec<usize>,
    /// Indices whose timing differed from the original and was restored
    pub restored_timing: Vec<usize>,
}

/// Re-check the no-overlap and non-empty-text invariants after translation.
///
/// Translation may change text but never timing, so timing always comes from
/// `originals`. An empty translation keeps the original text instead of
/// dropping the segment and losing its time slot.
pub fn reconcile_translated(originals: &[Segment], translated: &[Segment]) -> Reconciled {
    let mut reconciled = Reconciled {
        segments: Vec::with_capacity(originals.len()),
        ..Reconciled::default()
    };

    for (i, original) in originals.iter().enumerate() {
        let Some(candidate) = translated.get(i).filter(|t| t.index == original.index) else {
            reconciled.restored_text.push(original.index);
            reconciled.segments.push(original.clone());
            continue;
        };

        let mut segment = original.clone();
        if !candidate.same_timing(original) {
            reconciled.restored_timing.push(original.index);
        }

        let text = candidate.text.trim();
        if text.is_empty() {
            reconciled.restored_text.push(original.index);
        } else {
            segment.text = text.to_string();
        }

        reconciled.segments.push(segment);
    }

    reconciled
}
