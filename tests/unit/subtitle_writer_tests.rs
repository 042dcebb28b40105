/*!
 * Tests for subtitle serialization and SRT parsing
 */

use anyhow::Result;

use subtitletool::file_utils::FileManager;
use subtitletool::segment::Segment;
use subtitletool::subtitle_writer::{self, SubtitleFormat};

use crate::common;

fn segments() -> Vec<Segment> {
    vec![
        Segment::new(0, 0.5, 2.0, "First line"),
        Segment::new(1, 2.0, 4.25, "Second\nline"),
    ]
}

#[test]
fn test_srtOutput_shouldParseBackToSameSegments() -> Result<()> {
    let srt = subtitle_writer::to_srt(&segments());

    let parsed = subtitle_writer::parse_srt(&srt)?;

    assert_eq!(parsed, segments());
    Ok(())
}

#[test]
fn test_vttOutput_shouldHaveHeaderAndDotTimestamps() {
    let vtt = subtitle_writer::to_vtt(&segments());

    assert!(vtt.starts_with("WEBVTT\n\n"));
    assert!(vtt.contains("00:00:00.500 --> 00:00:02.000\nFirst line"));
}

#[test]
fn test_assOutput_shouldUseDefaultStyleAndEscapeNewlines() {
    let ass = subtitle_writer::to_ass(&segments());

    assert!(ass.contains("Style: Default"));
    assert!(ass.contains("Dialogue: 0,0:00:02.00,0:00:04.25,Default,,0,0,0,,Second\\Nline"));
}

#[test]
fn test_parseSrt_withUnorderedEntries_shouldSortByStart() -> Result<()> {
    let content = "2\n00:00:05,000 --> 00:00:06,000\nLater\n\n1\n00:00:01,000 --> 00:00:02,000\nEarlier\n";

    let parsed = subtitle_writer::parse_srt(content)?;

    assert_eq!(parsed[0].text, "Earlier");
    assert_eq!(parsed[0].index, 0);
    assert_eq!(parsed[1].start, 5.0);
    Ok(())
}

#[test]
fn test_parseSrt_withoutEntries_shouldFail() {
    assert!(subtitle_writer::parse_srt("just some text\n").is_err());
}

#[test]
fn test_format_shouldParseFromCommonNames() {
    assert_eq!("SRT".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Srt);
    assert_eq!(".webvtt".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Vtt);
    assert_eq!("ssa".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Ass);
    assert!("sub".parse::<SubtitleFormat>().is_err());
}

#[test]
fn test_cues_shouldFlagRightToLeftLanguages() {
    let rtl = subtitle_writer::cues(&segments(), "pes_Arab");
    let ltr = subtitle_writer::cues(&segments(), "fra_Latn");

    assert!(rtl.iter().all(|c| c.right_to_left));
    assert!(ltr.iter().all(|c| !c.right_to_left));
    assert_eq!(rtl[1].end, 4.25);
}

#[test]
fn test_writtenFiles_shouldLoadBackThroughFileManager() -> Result<()> {
    let dir = common::create_temp_dir()?;
    let srt_path = dir.path().join("nested").join("out.srt");
    let cues_path = dir.path().join("out.cues.json");

    subtitle_writer::write_subtitle_file(&srt_path, SubtitleFormat::Srt, &segments())?;
    subtitle_writer::write_cues_file(&cues_path, &subtitle_writer::cues(&segments(), "eng_Latn"))?;

    assert_eq!(FileManager::load_segments(&srt_path)?, segments());
    let cues: Vec<subtitle_writer::Cue> = serde_json::from_str(&FileManager::read_to_string(&cues_path)?)?;
    assert_eq!(cues.len(), 2);
    Ok(())
}
