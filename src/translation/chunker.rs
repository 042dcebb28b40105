/*!
 * Segment text chunking for translation requests.
 *
 * Segments are grouped into contiguous batches whose joined text fits the
 * translation API's limits. Each batch remembers the index range it covers
 * so its translation can be mapped back onto exactly those segments.
 */

use log::{debug, error};
use std::ops::RangeInclusive;

use crate::segment::Segment;

/// Separator placed between segment texts inside one request
pub const SEGMENT_SEPARATOR: &str = "\n<<SEG>>\n";

/// Token the separator is recognized by in translated text
pub const SEPARATOR_TOKEN: &str = "<<SEG>>";

/// Length of the separator in characters
pub fn separator_len() -> usize {
    SEGMENT_SEPARATOR.chars().count()
}

// @struct: Contiguous run of segments sent to the translator together
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    // @field: Position in creation order
    pub id: usize,

    // @field: Index of the first segment covered
    pub first_index: usize,

    // @field: Index of the last segment covered
    pub last_index: usize,

    // @field: Segment texts in index order
    pub texts: Vec<String>,

    // @field: A single segment whose text alone exceeds the budget
    pub oversized: bool,
}

impl Batch {
    /// Number of segments in the batch
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Segment indices covered by the batch
    pub fn range(&self) -> RangeInclusive<usize> {
        self.first_index..=self.last_index
    }

    /// Request text, segments joined with the separator
    pub fn joined_text(&self) -> String {
        self.texts.join(SEGMENT_SEPARATOR)
    }

    /// Length of the request text in characters
    pub fn joined_len(&self) -> usize {
        joined_len(&self.texts)
    }
}

fn joined_len(texts: &[String]) -> usize {
    let chars: usize = texts.iter().map(|t| t.chars().count()).sum();
    chars + separator_len() * texts.len().saturating_sub(1)
}

/// Open batch while chunking
struct PendingBatch {
    first_index: usize,
    last_index: usize,
    texts: Vec<String>,
    joined_len: usize,
}

impl PendingBatch {
    fn start(segment: &Segment) -> Self {
        Self {
            first_index: segment.index,
            last_index: segment.index,
            texts: vec![segment.text.clone()],
            joined_len: segment.char_count(),
        }
    }

    fn len_with(&self, segment: &Segment) -> usize {
        self.joined_len + separator_len() + segment.char_count()
    }

    fn push(&mut self, segment: &Segment) {
        self.joined_len = self.len_with(segment);
        self.last_index = segment.index;
        self.texts.push(segment.text.clone());
    }

    fn close(self, id: usize) -> Batch {
        Batch {
            id,
            first_index: self.first_index,
            last_index: self.last_index,
            texts: self.texts,
            oversized: false,
        }
    }
}

/// Group validated segments into batches.
///
/// Segments are added greedily while the joined text stays within
/// `max_chars_per_batch` and the batch holds fewer than
/// `max_segments_per_batch` segments. A segment that alone exceeds the
/// character budget gets a batch of its own flagged `oversized`.
pub fn chunk(segments: &[Segment], max_chars_per_batch: usize, max_segments_per_batch: usize) -> Vec<Batch> {
    let max_chars = max_chars_per_batch.max(1);
    let max_segments = max_segments_per_batch.max(1);

    let mut batches: Vec<Batch> = Vec::new();
    let mut current: Option<PendingBatch> = None;

    for segment in segments {
        let size = segment.char_count();

        if size > max_chars {
            if let Some(pending) = current.take() {
                let id = batches.len();
                batches.push(pending.close(id));
            }

            debug!("Segment {} is oversized ({} chars), placing in its own batch", segment.index, size);
            batches.push(Batch {
                id: batches.len(),
                first_index: segment.index,
                last_index: segment.index,
                texts: vec![segment.text.clone()],
                oversized: true,
            });
            continue;
        }

        match current.as_mut() {
            Some(pending) if pending.len_with(segment) <= max_chars && pending.texts.len() < max_segments => {
                pending.push(segment);
            }
            _ => {
                if let Some(pending) = current.take() {
                    let id = batches.len();
                    batches.push(pending.close(id));
                }
                current = Some(PendingBatch::start(segment));
            }
        }
    }

    if let Some(pending) = current.take() {
        let id = batches.len();
        batches.push(pending.close(id));
    }

    let total_batched: usize = batches.iter().map(Batch::len).sum();
    if total_batched != segments.len() {
        error!(
            "Lost segments during chunking! Original: {}, after chunking: {}",
            segments.len(),
            total_batched
        );
    } else if log::max_level() >= log::LevelFilter::Debug {
        for batch in &batches {
            debug!(
                "Batch {}: segments {}..={} ({} segments, {} chars{})",
                batch.id,
                batch.first_index,
                batch.last_index,
                batch.len(),
                batch.joined_len(),
                if batch.oversized { ", oversized" } else { "" }
            );
        }
    }

    batches
}

/// Part of an oversized text
#[derive(Debug, Clone, PartialEq)]
pub struct TextPiece {
    pub text: String,
    /// The piece ends in a hard cut, possibly mid-word
    pub lossy: bool,
}

/// Split text that exceeds `limit` characters into pieces that fit.
///
/// Each cut is made at the last whitespace within the limit. When a run of
/// text has no whitespace the cut falls exactly at the limit and the piece
/// is marked lossy.
pub fn split_oversized(text: &str, limit: usize) -> Vec<TextPiece> {
    let limit = limit.max(1);
    let chars: Vec<char> = text.trim().chars().collect();
    let mut pieces = Vec::new();
    let mut rest: &[char] = &chars;

    while rest.len() > limit {
        let cut = (1..=limit).rev().find(|&i| rest[i].is_whitespace());

        let (piece, lossy, next) = match cut {
            Some(i) => (&rest[..i], false, &rest[i..]),
            None => (&rest[..limit], true, &rest[limit..]),
        };

        let piece: String = piece.iter().collect();
        let piece = piece.trim_end();
        if !piece.is_empty() {
            pieces.push(TextPiece {
                text: piece.to_string(),
                lossy,
            });
        }

        let skip = next.iter().take_while(|c| c.is_whitespace()).count();
        rest = &next[skip..];
    }

    if !rest.is_empty() {
        pieces.push(TextPiece {
            text: rest.iter().collect(),
            lossy: false,
        });
    }

    pieces
}
