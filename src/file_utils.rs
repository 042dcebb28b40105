use anyhow::{Context, Result, anyhow};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::segment::{RawTranscript, Segment};
use crate::subtitle_writer;

// @module: File and directory utilities

/// Extensions accepted as pipeline input
pub const INPUT_EXTENSIONS: &[&str] = &["json", "srt"];

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for a subtitle file
    // @params: input_file, output_dir, language, extension
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        language: &str,
        extension: &str,
    ) -> PathBuf {
        let stem = input_file.as_ref().file_stem().unwrap_or_default().to_string_lossy();
        output_dir
            .as_ref()
            .join(format!("{}.{}.{}", stem, language, extension.trim_start_matches('.')))
    }

    /// Find files with any of the given extensions below a directory, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            let matches = path.is_file()
                && path.extension().is_some_and(|ext| {
                    let ext = ext.to_string_lossy();
                    extensions
                        .iter()
                        .any(|wanted| ext.eq_ignore_ascii_case(wanted.trim_start_matches('.')))
                });

            if matches {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Detect whether a file holds recognizer output or an SRT subtitle
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> Result<FileType> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(anyhow!("File does not exist: {:?}", path));
        }

        if let Some(ext) = path.extension() {
            match ext.to_string_lossy().to_lowercase().as_str() {
                "json" => return Ok(FileType::Transcript),
                "srt" => return Ok(FileType::Subtitle),
                _ => {}
            }
        }

        // Fall back to examining file contents
        if let Ok(content) = fs::read_to_string(path) {
            let trimmed = content.trim_start_matches('\u{feff}').trim_start();
            if trimmed.starts_with('[') || trimmed.starts_with('{') {
                return Ok(FileType::Transcript);
            }
            if content.contains("-->") {
                return Ok(FileType::Subtitle);
            }
        }

        Ok(FileType::Unknown)
    }

    /// Load raw segments from recognizer JSON or an SRT file
    pub fn load_segments<P: AsRef<Path>>(path: P) -> Result<Vec<Segment>> {
        let path = path.as_ref();
        let content = Self::read_to_string(path)?;

        match Self::detect_file_type(path)? {
            FileType::Transcript => {
                let transcript: RawTranscript = serde_json::from_str(content.trim_start_matches('\u{feff}'))
                    .with_context(|| format!("Failed to parse transcript: {:?}", path))?;
                Ok(transcript.into_segments())
            }
            FileType::Subtitle => subtitle_writer::parse_srt(&content)
                .with_context(|| format!("Failed to parse subtitle file: {:?}", path)),
            FileType::Unknown => Err(anyhow!("Unsupported input file: {:?}", path)),
        }
    }
}

/// Enum representing different input file types
#[derive(Debug, PartialEq, Eq)]
pub enum FileType {
    /// Recognizer output as JSON
    Transcript,
    /// SRT subtitle file
    Subtitle,
    /// Unknown file type
    Unknown,
}
