// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use subtitletool::app_config::{self, Config, TranslationProvider};
use subtitletool::app_controller::{Controller, FileOutcome};
use subtitletool::subtitle_writer::SubtitleFormat;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for TranslationProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationProvider {
    #[value(alias = "hf")]
    HuggingFace,
    Passthrough,
}

impl From<CliTranslationProvider> for TranslationProvider {
    fn from(cli_provider: CliTranslationProvider) -> Self {
        match cli_provider {
            CliTranslationProvider::HuggingFace => TranslationProvider::HuggingFace,
            CliTranslationProvider::Passthrough => TranslationProvider::Passthrough,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Repair timing and optionally translate a transcript or subtitle file
    Process(ProcessArgs),

    /// Search stored subtitles by text
    Search {
        /// Text to look for
        query: String,

        /// Only search subtitles of this input file
        #[arg(long)]
        media: Option<String>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// List processed inputs stored in the subtitle database
    List {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Show subtitle database statistics
    Stats {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Generate shell completions for subtitletool
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    /// Recognizer JSON, SRT file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Directory for the outputs (default: next to each input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Force overwrite of existing output files
    #[arg(short, long)]
    force_overwrite: bool,

    /// Translate the segments
    #[arg(long)]
    translate: bool,

    /// Translation provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliTranslationProvider>,

    /// Source language code (e.g. 'en', 'eng_Latn')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code (e.g. 'fa', 'pes_Arab')
    #[arg(short, long)]
    target_language: Option<String>,

    /// Output formats, replaces the configured list
    #[arg(long = "format", value_enum)]
    formats: Vec<SubtitleFormat>,

    /// Also write the cue list for the video compositor
    #[arg(long)]
    cues: bool,

    /// Store the result in the subtitle database
    #[arg(long)]
    store: bool,

    #[command(flatten)]
    common: CommonArgs,
}

/// subtitletool - timing repair and batch translation of subtitles
#[derive(Parser, Debug)]
#[command(name = "subtitletool")]
#[command(version)]
#[command(about = "Subtitle timing repair and batch translation")]
#[command(long_about = "subtitletool turns speech recognition segments into synchronized subtitles.

EXAMPLES:
    subtitletool process talk.json                          # Repair timing, write talk.eng_Latn.srt
    subtitletool process --translate -t fa talk.json        # Translate into Persian
    subtitletool process --format vtt --format ass talk.srt # Re-time an existing subtitle
    subtitletool process --cues --store /recordings/        # Whole directory, with cues and storage
    subtitletool search \"hello\"                             # Search stored subtitles
    subtitletool list                                       # List processed inputs
    subtitletool completions bash > subtitletool.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Prefix and ANSI colour for a log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("ERROR", "1;31"),
            Level::Warn => ("WARN ", "1;33"),
            Level::Info => ("INFO ", "1;32"),
            Level::Debug => ("DEBUG", "1;36"),
            Level::Trace => ("TRACE", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (prefix, colour) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, prefix, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Start at trace so the configured level can be applied with set_max_level later
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subtitletool", &mut std::io::stdout());
            Ok(())
        }
        Commands::Process(args) => run_process(args).await,
        Commands::Search { query, media, common } => {
            let config = load_config(&common)?;
            let controller = Controller::with_config(config)?;
            let found = controller.search(&query, media.as_deref()).await?;

            if found.is_empty() {
                info!("No subtitles match '{}'", query);
            }
            for record in found {
                println!(
                    "{} [{}] #{} {:.3}-{:.3}: {}",
                    record.media_path, record.language, record.seq_num, record.start_time, record.end_time, record.text
                );
            }
            Ok(())
        }
        Commands::List { common } => {
            let config = load_config(&common)?;
            let controller = Controller::with_config(config)?;
            let processed = controller.processed_media().await?;

            if processed.is_empty() {
                info!("No processed inputs stored yet");
            }
            for (media, count) in processed {
                println!("{}  {} subtitles  (processed {})", media.path, count, media.processed_at);
            }
            Ok(())
        }
        Commands::Stats { common } => {
            let config = load_config(&common)?;
            let controller = Controller::with_config(config)?;
            println!("{}", controller.stats()?);
            Ok(())
        }
    }
}

/// Load the config file, creating it with defaults when missing
fn load_config(common: &CommonArgs) -> Result<Config> {
    if let Some(cmd_log_level) = &common.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level_filter(&level));
    }

    let config_path = &common.config_path;
    let mut config: Config = if Path::new(config_path).exists() {
        let file = File::open(config_path).context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json =
            serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    match &common.log_level {
        Some(log_level) => config.log_level = log_level.clone().into(),
        None => log::set_max_level(level_filter(&config.log_level)),
    }

    Ok(config)
}

async fn run_process(options: ProcessArgs) -> Result<()> {
    let mut config = load_config(&options.common)?;

    // Override config with CLI options if provided
    if options.translate {
        config.translate = true;
    }
    if let Some(provider) = &options.provider {
        config.translation.provider = provider.clone().into();
    }
    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }
    if !options.formats.is_empty() {
        config.output.formats = options.formats.clone();
    }
    if options.cues {
        config.output.write_cues = true;
    }
    if options.store {
        config.database.enabled = true;
    }

    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;

    if options.input_path.is_file() {
        let output_dir = match &options.output_dir {
            Some(dir) => dir.clone(),
            None => options.input_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        };
        if let FileOutcome::Processed(paths) =
            controller.run(options.input_path.clone(), output_dir, options.force_overwrite).await?
        {
            for path in paths {
                info!("Success: {:?}", path);
            }
        }
    } else if options.input_path.is_dir() {
        if options.output_dir.is_some() {
            warn!("--output-dir is ignored for directories, outputs are written next to each input");
        }
        let summary = controller.run_folder(options.input_path.clone(), options.force_overwrite).await?;
        if summary.errors > 0 {
            return Err(anyhow!("{} file(s) failed", summary.errors));
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", options.input_path));
    }

    Ok(())
}
