/*!
 * Database entity models.
 *
 * These structures map directly to database rows.
 */

use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// A processed input file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    /// Path of the input, as given on the command line
    pub path: String,
    /// RFC 3339 timestamp of the last run
    pub processed_at: String,
}

/// One stored subtitle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleRecord {
    pub media_path: String,
    pub language: String,
    pub seq_num: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub text: String,
    pub confidence: Option<f64>,
}

impl SubtitleRecord {
    /// Build the record for one final segment
    pub fn from_segment(media_path: &str, language: &str, segment: &Segment) -> Self {
        Self {
            media_path: media_path.to_string(),
            language: language.to_string(),
            seq_num: segment.index,
            start_time: segment.start,
            end_time: segment.end,
            text: segment.text.clone(),
            confidence: segment.confidence,
        }
    }

    /// Back to a pipeline segment
    pub fn to_segment(&self) -> Segment {
        Segment {
            index: self.seq_num,
            start: self.start_time,
            end: self.end_time,
            text: self.text.clone(),
            confidence: self.confidence,
        }
    }
}
