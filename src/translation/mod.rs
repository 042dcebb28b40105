/*!
 * Batch translation of validated segments.
 *
 * - `chunker`: Groups segment text into size-bounded batches
 * - `reassembler`: Maps batch translations back onto segments
 * - `retry`: Backoff policy for transient provider failures
 * - `pipeline`: Validation, translation and reassembly end to end
 */

pub mod chunker;
pub mod pipeline;
pub mod reassembler;
pub mod retry;

// Re-export main types for easier usage
pub use self::chunker::{Batch, SEGMENT_SEPARATOR};
pub use self::pipeline::{PipelineOutput, ProgressCallback, SubtitlePipeline};
pub use self::reassembler::{BatchFallback, Reassembled};
pub use self::retry::{AttemptOutcome, RetryPolicy};
