// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow, Context};
use log::{error, warn, info, debug, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::io::Write;
use std::sync::Arc;
use clap::{Args, Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use capgrab::app_config::{self, Config};
use capgrab::file_utils::FileManager;
use capgrab::providers::http::HttpFetcher;
use capgrab::providers::PageSource;
use capgrab::providers::page::StaticPage;
use capgrab::storage::{FileKeyValueStore, KeyValueStore, PublicSubtitleRecord, process_fetched_subtitles};
use capgrab::subtitle_fetcher::SubtitleFetcher;

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch and convert the captions of saved video pages (default command)
    #[command(alias = "grab")]
    Fetch(FetchArgs),

    /// Generate shell completions for capgrab
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct FetchArgs {
    /// Saved video page, or a directory of saved pages
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    #[command(flatten)]
    options: FetchOptions,
}

#[derive(Args, Debug, Clone)]
struct FetchOptions {
    /// Preferred caption language code (e.g. 'en', 'pt-BR'); all tracks when omitted
    #[arg(short, long)]
    language: Option<String>,

    /// With --language, take the auto-generated track instead of the human one
    #[arg(short = 'a', long)]
    prefer_auto_generated: bool,

    /// Store converted tracks in the key-value store
    #[arg(short, long)]
    save: bool,

    /// Video id used in record ids (defaults to the page file name)
    #[arg(long)]
    video_id: Option<String>,

    /// Write the records JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write each track as <video_id>.<lang>.<type>.srt into this directory
    #[arg(long)]
    srt_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// capgrab - caption grabber for video pages
///
/// Reads the player response of a saved video page, downloads its caption
/// tracks and converts them to SRT.
#[derive(Parser, Debug)]
#[command(name = "capgrab")]
#[command(version)]
#[command(about = "Download video captions as SRT")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "capgrab reads the player response of a saved video page, downloads the caption tracks it lists and converts them to SRT.

EXAMPLES:
    capgrab watch.html                         # Every track of one page
    capgrab -l en watch.html                   # Human-authored English track only
    capgrab -l en -a watch.html                # Auto-generated English track only
    capgrab -s --video-id dQw4w9WgXcQ page.html # Store results in the key-value store
    capgrab --srt-dir subs/ pages/             # Every page in a directory, .srt files too
    capgrab completions bash > capgrab.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Saved video page, or a directory of saved pages
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    #[command(flatten)]
    options: FetchOptions,
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

    // @returns: Tag and ANSI colour for level
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
            let (tag, colour) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                colour, now, tag, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logger starts at trace so that later set_max_level calls can raise verbosity
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "capgrab", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Fetch(args)) => run_fetch(args).await,
        None => {
            let input_path = cli.input_path.ok_or_else(|| {
                anyhow!("INPUT_PATH is required when no subcommand is specified")
            })?;

            run_fetch(FetchArgs {
                input_path,
                options: cli.options,
            }).await
        }
    }
}

fn load_config(options: &FetchOptions) -> Result<Config> {
    let config_path = &options.config_path;
    let mut config = if FileManager::file_exists(config_path) {
        let content = FileManager::read_to_string(config_path)?;
        serde_json::from_str::<Config>(&content)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        FileManager::write_to_file(config_path, &config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // Command line options win over the file
    if let Some(language) = &options.language {
        config.subtitles.language = Some(language.clone());
    }
    if options.prefer_auto_generated {
        config.subtitles.prefer_auto_generated = true;
    }
    if options.save {
        config.subtitles.save_to_kvs = true;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

async fn run_fetch(args: FetchArgs) -> Result<()> {
    if let Some(cmd_log_level) = &args.options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&args.options)?;
    log::set_max_level(config.log_level.to_level_filter());

    let fetcher = HttpFetcher::new(&config.http)?;
    let subtitle_fetcher = SubtitleFetcher::new(Arc::new(fetcher));

    let store = if config.subtitles.save_to_kvs {
        let store = FileKeyValueStore::from_config(&config.storage)?;
        info!("Saving subtitles to {}", store.directory().display());
        Some(store)
    } else {
        None
    };
    let store_ref = store.as_ref().map(|s| s as &dyn KeyValueStore);

    let output = if FileManager::file_exists(&args.input_path) {
        let video_id = args.options.video_id.clone()
            .unwrap_or_else(|| FileManager::video_id_for(&args.input_path));

        let records = process_page(&subtitle_fetcher, &config, &args.input_path, &video_id, store_ref).await?;
        write_srt_files(args.options.srt_dir.as_deref(), &video_id, &records).await?;
        serde_json::to_string_pretty(&records)?
    } else if FileManager::dir_exists(&args.input_path) {
        if args.options.video_id.is_some() {
            warn!("--video-id is ignored for directories; page file names are used instead");
        }

        let pages = FileManager::find_pages(&args.input_path)?;
        info!("Found {} saved page(s) in {:?}", pages.len(), args.input_path);

        let mut all_records = BTreeMap::new();
        for page_path in pages {
            let video_id = FileManager::video_id_for(&page_path);
            match process_page(&subtitle_fetcher, &config, &page_path, &video_id, store_ref).await {
                Ok(records) => {
                    write_srt_files(args.options.srt_dir.as_deref(), &video_id, &records).await?;
                    all_records.insert(video_id, records);
                }
                Err(e) => error!("Error processing page {:?}: {}", page_path, e),
            }
        }

        serde_json::to_string_pretty(&all_records)?
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", args.input_path));
    };

    match &args.options.output {
        Some(path) => {
            write_output(path, &output).await?;
            info!("Success: {:?}", path);
        }
        None => println!("{}", output),
    }

    Ok(())
}

async fn process_page(
    subtitle_fetcher: &SubtitleFetcher,
    config: &Config,
    page_path: &Path,
    video_id: &str,
    store: Option<&dyn KeyValueStore>,
) -> Result<Vec<PublicSubtitleRecord>> {
    let page = StaticPage::from_file(page_path).await?;
    let selection = config.subtitles.selection();

    let results = subtitle_fetcher.fetch_subtitles(&page, &selection).await;
    info!("Converted {} subtitle track(s) for {}", results.len(), video_id);

    let records = process_fetched_subtitles(&page.url(), video_id, &results, store).await?;
    Ok(records)
}

async fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write to file: {:?}", path))
}

async fn write_srt_files(srt_dir: Option<&Path>, video_id: &str, records: &[PublicSubtitleRecord]) -> Result<()> {
    let Some(srt_dir) = srt_dir else {
        return Ok(());
    };

    for record in records {
        let path = FileManager::generate_srt_path(srt_dir, video_id, &record.language, record.kind);
        write_output(&path, &record.srt).await?;
        debug!("Wrote {:?}", path);
    }

    Ok(())
}
