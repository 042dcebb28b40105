/*!
 * # subtitletool
 *
 * Turns time-stamped speech recognition output into synchronized subtitles.
 *
 * ## Features
 *
 * - Timing repair: ordering, overlaps, zero-length and too-short segments
 * - Optional batch translation through a remote NLLB translator, with
 *   bounded concurrency, retries and per-batch fallback to the original text
 * - SRT, WebVTT and ASS output plus a render-ready cue list
 * - SQLite storage of processed subtitles with text search
 *
 * ## Architecture
 *
 * - `segment`: The subtitle segment and the recognizer's wire shape
 * - `timing`: Timing validation and the post-translation invariant check
 * - `text_cleanup`: Whitespace and punctuation cleanup of segment text
 * - `translation`: Batch translation:
 *   - `translation::chunker`: Size-bounded batches with index ranges
 *   - `translation::reassembler`: Per-segment restoration of batch translations
 *   - `translation::retry`: Backoff policy and attempt outcomes
 *   - `translation::pipeline`: The end-to-end pipeline
 * - `providers`: The `Translator` trait and its implementations
 * - `subtitle_writer`: Subtitle serialization and SRT parsing
 * - `app_config`, `app_controller`, `file_utils`, `language_utils`,
 *   `database`, `errors`: Application plumbing
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod segment;
pub mod subtitle_writer;
pub mod text_cleanup;
pub mod timing;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, PipelineConfig};
pub use app_controller::Controller;
pub use errors::{AppError, PipelineError, ProviderError};
pub use providers::Translator;
pub use segment::Segment;
pub use subtitle_writer::SubtitleFormat;
pub use translation::{PipelineOutput, SubtitlePipeline};
