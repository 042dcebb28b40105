use serde::{Deserialize, Serialize};
use std::fmt;

// @module: Transcription segment model

// @struct: Single time-stamped unit of transcribed or translated text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    // @field: Ordinal position in the sequence
    pub index: usize,

    // @field: Start time in seconds
    pub start: f64,

    // @field: End time in seconds
    pub end: f64,

    // @field: Segment text
    pub text: String,

    // @field: Recognizer confidence, carried through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Segment {
    /// Creates a new segment without confidence metadata
    pub fn new(index: usize, start: f64, end: f64, text: impl Into<String>) -> Self {
        Segment {
            index,
            start,
            end,
            text: text.into(),
            confidence: None,
        }
    }

    /// Attach recognizer confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Length of the segment in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Number of characters in the text, the unit translation budgets are expressed in
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the two segments carry the same timing, bit for bit
    pub fn same_timing(&self, other: &Segment) -> bool {
        self.start.to_bits() == other.start.to_bits() && self.end.to_bits() == other.end.to_bits()
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{} [{:.3}s - {:.3}s] {}", self.index, self.start, self.end, self.text)
    }
}

/// Segment as delivered by the speech recognizer, with no guarantees at all
#[derive(Debug, Clone, Deserialize)]
pub struct RawSegment {
    #[serde(default)]
    pub start: f64,
    #[serde(default)]
    pub end: f64,
    #[serde(default)]
    pub text: String,
    #[serde(default, alias = "avg_logprob")]
    pub confidence: Option<f64>,
}

/// Whisper writes its output as `{"text": ..., "segments": [...]}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawTranscript {
    Segments(Vec<RawSegment>),
    Whisper { segments: Vec<RawSegment> },
}

impl RawTranscript {
    /// Number the raw segments in arrival order
    pub fn into_segments(self) -> Vec<Segment> {
        let raw = match self {
            RawTranscript::Segments(segments) => segments,
            RawTranscript::Whisper { segments } => segments,
        };

        raw.into_iter()
            .enumerate()
            .map(|(index, raw)| Segment {
                index,
                start: raw.start,
                end: raw.end,
                text: raw.text,
                confidence: raw.confidence,
            })
            .collect()
    }
}
