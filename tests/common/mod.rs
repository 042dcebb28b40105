/*!
 * Common test utilities for the subtitletool test suite
 */

#![allow(dead_code)]

use anyhow::Result;
use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use subtitletool::app_config::{BatchConfig, PipelineConfig};
use subtitletool::segment::Segment;
use subtitletool::translation::RetryPolicy;

/// Route library logs through the test harness, once per process
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Creates a recognizer output file with an overlap and an empty segment
pub fn create_test_transcript(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = r#"[
  {"start": 0.0, "end": 2.0, "text": "Hello", "confidence": 0.9},
  {"start": 1.9, "end": 3.0, "text": "world"},
  {"start": 3.0, "end": 4.0, "text": "   "},
  {"start": 4.0, "end": 6.5, "text": "How are you?", "avg_logprob": -0.3}
]"#;
    create_test_file(dir, filename, content)
}

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    let content = r#"1
00:00:01,000 --> 00:00:04,000
This is a test subtitle.

2
00:00:05,000 --> 00:00:09,000
It contains multiple entries.

3
00:00:10,000 --> 00:00:14,000
For testing purposes.
"#;
    create_test_file(dir, filename, content)
}

/// Pipeline settings with millisecond backoff so retry tests stay fast
pub fn fast_pipeline_config() -> PipelineConfig {
    PipelineConfig {
        retry: RetryPolicy {
            max_retries: 3,
            base_delay_ms: 1,
            max_delay_ms: 4,
        },
        ..PipelineConfig::default()
    }
}

/// Fast pipeline settings with small batches
pub fn small_batch_config(max_chars_per_batch: usize, max_segments_per_batch: usize) -> PipelineConfig {
    PipelineConfig {
        batching: BatchConfig {
            max_chars_per_batch,
            max_segments_per_batch,
        },
        ..fast_pipeline_config()
    }
}

/// Well-formed segments one second apart with numbered text
pub fn sequential_segments(count: usize) -> Vec<Segment> {
    (0..count)
        .map(|i| Segment::new(i, i as f64, i as f64 + 0.9, format!("Line number {}", i)))
        .collect()
}

/// Random, frequently malformed recognizer output
pub fn random_raw_segments(rng: &mut impl Rng, count: usize) -> Vec<Segment> {
    (0..count)
        .map(|i| {
            let start = rng.random_range(-1.0..60.0);
            let end = start + rng.random_range(-2.0..5.0);
            let text = match rng.random_range(0..5) {
                0 => String::new(),
                1 => "  ".to_string(),
                n => "word ".repeat(n * rng.random_range(1..20)),
            };
            Segment::new(i, start, end, text)
        })
        .collect()
}
