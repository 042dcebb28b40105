use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::language_utils;
use crate::segment::Segment;

// @module: Subtitle file serialization and parsing

// @const: SRT timestamp regex
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+):(\d{2}):(\d{2})[,.](\d{3})\s*-->\s*(\d+):(\d{2}):(\d{2})[,.](\d{3})")
        .expect("timestamp pattern is valid")
});

/// Subtitle file formats the tool can write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    /// SubRip
    Srt,
    /// WebVTT
    Vtt,
    /// Advanced SubStation Alpha
    Ass,
}

impl SubtitleFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Srt => "srt",
            Self::Vtt => "vtt",
            Self::Ass => "ass",
        }
    }

    /// Render segments in this format
    pub fn render(&self, segments: &[Segment]) -> String {
        match self {
            Self::Srt => to_srt(segments),
            Self::Vtt => to_vtt(segments),
            Self::Ass => to_ass(segments),
        }
    }
}

impl fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for SubtitleFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "srt" => Ok(Self::Srt),
            "vtt" | "webvtt" => Ok(Self::Vtt),
            "ass" | "ssa" => Ok(Self::Ass),
            _ => Err(anyhow!("Unsupported subtitle format: {}", s)),
        }
    }
}

/// Seconds to whole milliseconds, rounded
fn to_millis(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    }
}

/// Format seconds as an SRT timestamp (HH:MM:SS,mmm)
pub fn format_srt_timestamp(seconds: f64) -> String {
    let ms = to_millis(seconds);
    format!(
        "{:02}:{:02}:{:02},{:03}",
        ms / 3_600_000,
        (ms % 3_600_000) / 60_000,
        (ms % 60_000) / 1_000,
        ms % 1_000
    )
}

/// Format seconds as a WebVTT timestamp (HH:MM:SS.mmm)
pub fn format_vtt_timestamp(seconds: f64) -> String {
    format_srt_timestamp(seconds).replacen(',', ".", 1)
}

/// Format seconds as an ASS timestamp (H:MM:SS.cc)
pub fn format_ass_timestamp(seconds: f64) -> String {
    let cs = (to_millis(seconds) + 5) / 10;
    format!(
        "{}:{:02}:{:02}.{:02}",
        cs / 360_000,
        (cs % 360_000) / 6_000,
        (cs % 6_000) / 100,
        cs % 100
    )
}

/// Render segments as SRT, numbered from 1
pub fn to_srt(segments: &[Segment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_timestamp(segment.start),
            format_srt_timestamp(segment.end),
            segment.text
        ));
    }
    out
}

/// Render segments as WebVTT
pub fn to_vtt(segments: &[Segment]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for segment in segments {
        out.push_str(&format!(
            "{} --> {}\n{}\n\n",
            format_vtt_timestamp(segment.start),
            format_vtt_timestamp(segment.end),
            segment.text
        ));
    }
    out
}

const ASS_HEADER: &str = "[Script Info]
Title: Generated Subtitles
ScriptType: v4.00+

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,20,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,2,2,10,10,10,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
";

/// Render segments as ASS with a single default style
pub fn to_ass(segments: &[Segment]) -> String {
    let mut out = String::from(ASS_HEADER);
    for segment in segments {
        out.push_str(&format!(
            "Dialogue: 0,{},{},Default,,0,0,0,,{}\n",
            format_ass_timestamp(segment.start),
            format_ass_timestamp(segment.end),
            segment.text.replace('\n', "\\N")
        ));
    }
    out
}

/// Write segments to `path` in the given format
pub fn write_subtitle_file<P: AsRef<Path>>(path: P, format: SubtitleFormat, segments: &[Segment]) -> Result<()> {
    let path = path.as_ref();

    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    fs::write(path, format.render(segments))
        .with_context(|| format!("Failed to write subtitle file: {}", path.display()))?;

    debug!("Wrote {} segments to {}", segments.len(), path.display());
    Ok(())
}

fn captured_millis(caps: &regex::Captures, start_idx: usize) -> u64 {
    let part = |i: usize| -> u64 { caps.get(start_idx + i).map_or(0, |m| m.as_str().parse().unwrap_or(0)) };
    (part(0) * 3600 + part(1) * 60 + part(2)) * 1000 + part(3)
}

/// Parse SRT content into raw segments.
///
/// Timing defects are left for the validator. Entries without text or
/// without a timestamp line are skipped.
pub fn parse_srt(content: &str) -> Result<Vec<Segment>> {
    let mut entries: Vec<(u64, u64, String)> = Vec::new();
    let mut timing: Option<(u64, u64)> = None;
    let mut text = String::new();

    let mut flush = |timing: &mut Option<(u64, u64)>, text: &mut String| {
        if let Some((start, end)) = timing.take() {
            if text.trim().is_empty() {
                warn!("Skipping empty subtitle entry at {} ms", start);
            } else {
                entries.push((start, end, text.trim().to_string()));
            }
        }
        text.clear();
    };

    for (line_no, line) in content.lines().enumerate() {
        let trimmed = line.trim().trim_start_matches('\u{feff}');

        if trimmed.is_empty() {
            flush(&mut timing, &mut text);
            continue;
        }

        if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
            if timing.is_some() {
                flush(&mut timing, &mut text);
            }
            timing = Some((captured_millis(&caps, 1), captured_millis(&caps, 5)));
            continue;
        }

        if timing.is_none() {
            // Sequence numbers and stray lines before a timestamp
            if trimmed.parse::<usize>().is_err() {
                warn!("Unexpected text at line {} before a timestamp: {}", line_no + 1, trimmed);
            }
            continue;
        }

        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(trimmed);
    }
    flush(&mut timing, &mut text);

    if entries.is_empty() {
        return Err(anyhow!("No valid subtitle entries were found in the SRT content"));
    }

    // Sort by start time to ensure correct order
    entries.sort_by_key(|(start, _, _)| *start);

    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(i, (start, end, text))| Segment::new(i, start as f64 / 1000.0, end as f64 / 1000.0, text))
        .collect())
}

/// Render-ready subtitle for the video compositor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
    /// The compositor must shape and reorder the text for right-to-left display
    pub right_to_left: bool,
}

/// Build the cue list for segments in `language`
pub fn cues(segments: &[Segment], language: &str) -> Vec<Cue> {
    let right_to_left = language_utils::is_rtl_language(language);
    segments
        .iter()
        .map(|segment| Cue {
            index: segment.index,
            start: segment.start,
            end: segment.end,
            text: segment.text.clone(),
            right_to_left,
        })
        .collect()
}

/// Write the cue list as pretty JSON
pub fn write_cues_file<P: AsRef<Path>>(path: P, cues: &[Cue]) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(cues).context("Failed to serialize cue list")?;
    fs::write(path, json).with_context(|| format!("Failed to write cue list: {}", path.display()))
}
