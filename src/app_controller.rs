/*!
 * Application controller.
 *
 * Drives the subtitle pipeline over one input file or a whole folder: loads
 * segments, runs timing repair and optional translation, writes the
 * configured subtitle formats and stores the result when the database is
 * enabled.
 */

use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::app_config::{Config, TranslationProvider};
use crate::database::{DatabaseStats, MediaRecord, Repository, SubtitleRecord};
use crate::errors::AppError;
use crate::file_utils::{FileManager, INPUT_EXTENSIONS};
use crate::language_utils;
use crate::providers::huggingface::HuggingFace;
use crate::providers::passthrough::Passthrough;
use crate::providers::Translator;
use crate::subtitle_writer::{self, SubtitleFormat};
use crate::translation::pipeline::{PipelineOutput, ProgressCallback, SubtitlePipeline};

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg} {eta}";

const FOLDER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}";

/// What happened to one input file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Outputs were written
    Processed(Vec<PathBuf>),
    /// Outputs already existed and overwriting was not forced
    Skipped,
}

/// Totals of one folder run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Main application controller
pub struct Controller {
    config: Config,
    translator: Arc<dyn Translator>,
    show_progress: bool,
}

impl Controller {
    /// Create a controller using the provider named in the config
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let translator = Self::create_translator(&config);
        Ok(Self {
            config,
            translator,
            show_progress: true,
        })
    }

    /// Create a controller with an explicit translator
    pub fn with_translator(config: Config, translator: Arc<dyn Translator>) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self {
            config,
            translator,
            show_progress: true,
        })
    }

    /// Hide progress bars, for tests and non-interactive runs
    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn create_translator(config: &Config) -> Arc<dyn Translator> {
        match config.translation.provider {
            TranslationProvider::HuggingFace => Arc::new(HuggingFace::new(
                config.translation.endpoint.clone(),
                config.translation.timeout_secs,
            )),
            TranslationProvider::Passthrough => Arc::new(Passthrough),
        }
    }

    /// True when the configured languages call for a translation pass
    pub fn translation_enabled(&self) -> bool {
        self.config.translate
            && !language_utils::language_codes_match(&self.config.source_language, &self.config.target_language)
    }

    /// Language code the outputs are written in
    pub fn output_language(&self) -> &str {
        if self.translation_enabled() {
            &self.config.target_language
        } else {
            &self.config.source_language
        }
    }

    fn output_paths(&self, input_file: &Path, output_dir: &Path) -> Vec<PathBuf> {
        let language = self.output_language();
        let mut paths: Vec<PathBuf> = self
            .config
            .output
            .formats
            .iter()
            .map(|format| FileManager::generate_output_path(input_file, output_dir, language, format.extension()))
            .collect();
        if self.config.output.write_cues {
            paths.push(FileManager::generate_output_path(input_file, output_dir, language, "cues.json"));
        }
        paths
    }

    /// Process one input file, cancelling on Ctrl-C
    pub async fn run(&self, input_file: PathBuf, output_dir: PathBuf, force_overwrite: bool) -> Result<FileOutcome> {
        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, finishing with untranslated text");
                    cancel.cancel();
                }
            })
        };

        let result = self.run_with_cancel(&input_file, &output_dir, force_overwrite, &cancel).await;
        watcher.abort();
        result
    }

    /// Process one input file under an external cancellation token
    pub async fn run_with_cancel(
        &self,
        input_file: &Path,
        output_dir: &Path,
        force_overwrite: bool,
        cancel: &CancellationToken,
    ) -> Result<FileOutcome> {
        let start_time = Instant::now();

        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file not found: {:?}", input_file));
        }

        let output_paths = self.output_paths(input_file, output_dir);
        if !force_overwrite && output_paths.iter().all(|path| path.exists()) {
            warn!("Skipping {:?}, outputs already exist (use -f to force overwrite)", input_file);
            return Ok(FileOutcome::Skipped);
        }

        let raw = FileManager::load_segments(input_file)?;
        info!("Loaded {} segments from {:?}", raw.len(), input_file);

        let translate = self.translation_enabled();
        if self.config.translate && !translate {
            info!("Source and target language match, skipping translation");
        } else if translate {
            let name = |code: &str| language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string());
            info!(
                "Translating from {} to {} with {}",
                name(&self.config.source_language),
                name(&self.config.target_language),
                self.translator.name()
            );
        }

        let progress_bar = if translate && self.show_progress {
            Some(Self::create_progress_bar(PROGRESS_TEMPLATE))
        } else {
            None
        };

        let mut pipeline = SubtitlePipeline::new(self.translator.clone(), self.config.pipeline_config());
        if let Some(pb) = &progress_bar {
            let pb = pb.clone();
            let callback: ProgressCallback = Arc::new(move |done, total| {
                pb.set_length(total as u64);
                pb.set_position(done as u64);
            });
            pipeline = pipeline.with_progress(callback);
        }

        let output = pipeline.run(&raw, translate, cancel).await.map_err(AppError::from)?;

        if let Some(pb) = &progress_bar {
            pb.finish_with_message("done");
        }

        self.log_output(&output);

        let written = self.write_outputs(input_file, output_dir, &output)?;

        if self.config.database.enabled {
            let repository = Repository::open(self.config.database.path.as_deref())?;
            repository
                .store_subtitles(&input_file.to_string_lossy(), self.output_language(), &output.segments)
                .await?;
        }

        info!(
            "Processed {:?} in {}",
            input_file,
            Self::format_duration(start_time.elapsed())
        );

        Ok(FileOutcome::Processed(written))
    }

    fn write_outputs(&self, input_file: &Path, output_dir: &Path, output: &PipelineOutput) -> Result<Vec<PathBuf>> {
        FileManager::ensure_dir(output_dir)?;
        let language = self.output_language();
        let mut written = Vec::new();

        for format in &self.config.output.formats {
            let path = FileManager::generate_output_path(input_file, output_dir, language, format.extension());
            subtitle_writer::write_subtitle_file(&path, *format, &output.segments)?;
            info!("Wrote {} subtitles: {:?}", format, path);
            written.push(path);
        }

        if self.config.output.write_cues {
            let path = FileManager::generate_output_path(input_file, output_dir, language, "cues.json");
            let cues = subtitle_writer::cues(&output.segments, language);
            subtitle_writer::write_cues_file(&path, &cues)?;
            info!("Wrote {} cues: {:?}", cues.len(), path);
            written.push(path);
        }

        Ok(written)
    }

    fn log_output(&self, output: &PipelineOutput) {
        if !output.report.is_clean() {
            debug!("Timing adjustments: {:?}", output.report.adjustments);
        }

        if let Some(auth) = &output.auth_failure {
            error!("{}", auth);
        }

        for fallback in &output.fallbacks {
            warn!(
                "Segments {}-{} kept their original text: {}",
                fallback.first_index, fallback.last_index, fallback.reason
            );
        }

        for warning in &output.warnings {
            warn!("{}", warning);
        }

        if output.cancelled {
            warn!("Translation was cancelled");
        } else if output.batch_count > 0 && output.fully_translated() {
            info!("All {} batches translated", output.batch_count);
        }
    }

    /// Process every supported file below a directory, next to each input
    pub async fn run_folder(&self, input_dir: PathBuf, force_overwrite: bool) -> Result<FolderSummary> {
        if !FileManager::dir_exists(&input_dir) {
            return Err(anyhow!("Input directory not found: {:?}", input_dir));
        }

        let start_time = Instant::now();
        let files = FileManager::find_files(&input_dir, INPUT_EXTENSIONS)?;

        if files.is_empty() {
            warn!("No input files found in {:?}", input_dir);
            return Ok(FolderSummary::default());
        }

        info!("Found {} input files in {:?}", files.len(), input_dir);

        let folder_pb = if self.show_progress {
            let pb = Self::create_progress_bar(FOLDER_TEMPLATE);
            pb.set_length(files.len() as u64);
            Some(pb)
        } else {
            None
        };

        let cancel = CancellationToken::new();
        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, stopping after the current file");
                    cancel.cancel();
                }
            })
        };

        let mut summary = FolderSummary::default();

        for file in &files {
            if cancel.is_cancelled() {
                break;
            }

            // SRT outputs of an earlier run sit next to their inputs
            if self.is_own_output(file) {
                debug!("Ignoring generated file {:?}", file);
                if let Some(pb) = &folder_pb {
                    pb.inc(1);
                }
                continue;
            }

            if let Some(pb) = &folder_pb {
                pb.set_message(file.file_name().unwrap_or_default().to_string_lossy().to_string());
            }

            let output_dir = file.parent().unwrap_or(Path::new(".")).to_path_buf();
            match self.run_with_cancel(file, &output_dir, force_overwrite, &cancel).await {
                Ok(FileOutcome::Processed(_)) => summary.processed += 1,
                Ok(FileOutcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {:?}: {:#}", file, e);
                    summary.errors += 1;
                }
            }

            if let Some(pb) = &folder_pb {
                pb.inc(1);
            }
        }

        watcher.abort();

        if let Some(pb) = &folder_pb {
            pb.finish_with_message("Folder processing complete");
        }

        info!(
            "Folder processing completed: {} processed, {} skipped, {} errors ({})",
            summary.processed,
            summary.skipped,
            summary.errors,
            Self::format_duration(start_time.elapsed())
        );

        Ok(summary)
    }

    /// Generated files carry a language code before the extension. Outputs of
    /// earlier runs into other languages use NLLB codes.
    fn is_own_output(&self, file: &Path) -> bool {
        let Some(name) = file.file_name().map(|n| n.to_string_lossy().to_string()) else {
            return false;
        };
        let srt_suffix = format!(".{}", SubtitleFormat::Srt.extension());
        let Some(stem) = name.strip_suffix(".cues.json").or_else(|| name.strip_suffix(&srt_suffix)) else {
            return false;
        };
        let Some((_, language)) = stem.rsplit_once('.') else {
            return false;
        };

        language == self.output_language() || language_utils::parse_nllb_code(language).is_some()
    }

    /// Stored subtitles whose text contains `query`
    pub async fn search(&self, query: &str, media_path: Option<&str>) -> Result<Vec<SubtitleRecord>> {
        let repository = Repository::open(self.config.database.path.as_deref())?;
        repository.search_subtitles(query, media_path).await
    }

    /// Processed inputs, most recent first, with their stored subtitle counts
    pub async fn processed_media(&self) -> Result<Vec<(MediaRecord, usize)>> {
        let repository = Repository::open(self.config.database.path.as_deref())?;
        let mut listed = Vec::new();
        for media in repository.processed_media().await? {
            let count = repository.subtitle_count(&media.path).await?;
            listed.push((media, count));
        }
        Ok(listed)
    }

    /// Database statistics
    pub fn stats(&self) -> Result<DatabaseStats> {
        Repository::open(self.config.database.path.as_deref())?.stats()
    }

    fn create_progress_bar(template: &str) -> ProgressBar {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(template)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓▒░"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    /// Format a duration as `1h 2m 3s`, `2m 3s` or `3.4s`
    pub fn format_duration(duration: Duration) -> String {
        let total_secs = duration.as_secs();
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        let seconds = total_secs % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{:.1}s", duration.as_secs_f64())
        }
    }
}
