// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use rowlate::app_config::{self, Config};
use rowlate::app_controller::Controller;

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
    /// Translate every pending row (default command)
    Translate(TranslateArgs),

    /// Show how many rows are translated, without calling the endpoint
    Status(ConfigArgs),

    /// List the selectable models with the numbers the recovery menu uses
    Models(ConfigArgs),

    /// Build the database from one or more Yomitan dictionary archives
    Import(ImportArgs),

    /// Write a column of the table as a Yomitan dictionary archive
    Export(ExportArgs),

    /// Generate shell completions for rowlate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct ConfigArgs {
    /// Configuration file path
    #[arg(short, long = "config", default_value = "conf.json")]
    config_path: String,

    /// SQLite database file
    #[arg(short, long)]
    database: Option<String>,

    /// Table holding the rows
    #[arg(long)]
    table: Option<String>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug, Clone)]
struct TranslateArgs {
    #[command(flatten)]
    common: ConfigArgs,

    /// Column holding the stable row identifier
    #[arg(long)]
    id_column: Option<String>,

    /// Column with the text to translate
    #[arg(long)]
    source_column: Option<String>,

    /// Column receiving translations (created when missing)
    #[arg(long)]
    target_column: Option<String>,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// API key for the generation endpoint
    #[arg(short = 'k', long, env = "ROWLATE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Rows per request
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Source language code or name (e.g., 'en', 'English')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Target language code or name (e.g., 'ru', 'Russian')
    #[arg(short, long)]
    target_language: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct ImportArgs {
    /// Yomitan .zip archives to import
    #[arg(required = true)]
    archives: Vec<PathBuf>,

    /// Replace the database if it already exists
    #[arg(short, long)]
    force: bool,

    #[command(flatten)]
    common: ConfigArgs,
}

#[derive(Args, Debug, Clone)]
struct ExportArgs {
    /// Archive to write
    #[arg(short, long)]
    output: PathBuf,

    /// Dictionary title shown by the reader
    #[arg(short, long, default_value = "Exported Dictionary")]
    title: String,

    /// Column holding the definitions (default: the target column)
    #[arg(long)]
    column: Option<String>,

    /// Overwrite the archive if it already exists
    #[arg(short, long)]
    force: bool,

    #[command(flatten)]
    common: ConfigArgs,
}

/// Rowlate - translate a column of an SQLite table with a generative model
#[derive(Parser, Debug)]
#[command(name = "rowlate")]
#[command(version)]
#[command(about = "Batch translation of SQLite rows through a generateContent endpoint")]
#[command(long_about = "Rowlate reads rows whose target column is still empty, sends them in
numbered batches to a text-generation endpoint and writes the answers back.
Interrupting it is safe: the next run picks up the rows that are still empty.

EXAMPLES:
    rowlate                                  # Translate using conf.json
    rowlate -d dict.db --table words         # Override the database and table
    rowlate -m gemini-1.5-pro -b 20          # Use another model and smaller batches
    rowlate -s en -t de --target-column german
    rowlate status                           # Show progress without translating
    rowlate models                           # List selectable models
    rowlate import jmdict.zip -d dict.db     # Build the database from Yomitan archives
    rowlate export -o dict_ru.zip            # Publish the translated column
    rowlate completions bash > rowlate.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the file doesn't exist,
    a default one is created. The API key may also come from ROWLATE_API_KEY.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    translate: TranslateArgs,
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

    // @returns: ANSI color and emoji for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "❌ "),
            Level::Warn => ("\x1B[1;33m", "🚧 "),
            Level::Info => ("\x1B[1;32m", " "),
            Level::Debug => ("\x1B[1;36m", "🔍 "),
            Level::Trace => ("\x1B[1;35m", "📋 "),
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
            let (color, emoji) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger accepts everything; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "rowlate", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Status(args)) => run_status(args).await,
        Some(Commands::Models(args)) => run_models(args),
        Some(Commands::Import(args)) => run_import(args).await,
        Some(Commands::Export(args)) => run_export(args).await,
        Some(Commands::Translate(args)) => run_translate(args).await,
        None => run_translate(cli.translate).await,
    }
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let mut config = load_config(&options.common)?;

    let db = &mut config.database;
    if let Some(column) = &options.id_column {
        db.id_column = column.clone();
    }
    if let Some(column) = &options.source_column {
        db.source_column = column.clone();
    }
    if let Some(column) = &options.target_column {
        db.target_column = column.clone();
    }

    let tr = &mut config.translation;
    if let Some(model) = &options.model {
        tr.model = model.clone();
    }
    if let Some(api_key) = &options.api_key {
        tr.api_key = api_key.clone();
    }
    if let Some(batch_size) = options.batch_size {
        tr.batch_size = batch_size;
    }

    if let Some(source_lang) = &options.source_language {
        config.source_language = source_lang.clone();
    }
    if let Some(target_lang) = &options.target_language {
        config.target_language = target_lang.clone();
    }

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    match controller.run().await {
        Ok(_) => Ok(()),
        Err(e) if e.is_abort() => {
            warn!("Translation aborted; rows still pending will be picked up by the next run");
            std::process::exit(2);
        }
        Err(e) => Err(e.into()),
    }
}

async fn run_status(options: ConfigArgs) -> Result<()> {
    let config = load_config(&options)?;
    let controller = Controller::with_config(config)?;

    let status = controller.status().await?;
    let db = &controller.config().database;
    info!("{} ({}.{})", db.path, db.table, db.target_column);
    println!("{}", status);
    Ok(())
}

fn run_models(options: ConfigArgs) -> Result<()> {
    let config = load_config(&options)?;
    let controller = Controller::with_config(config)?;

    for line in controller.model_listing() {
        println!("{}", line);
    }
    Ok(())
}

async fn run_import(options: ImportArgs) -> Result<()> {
    let config = load_config(&options.common)?;
    let controller = Controller::with_config(config)?;

    let summary = controller
        .import_dictionaries(&options.archives, options.force)
        .await?;
    println!("{}", summary);

    if summary.archives_imported == 0 {
        anyhow::bail!("No archive could be imported");
    }
    Ok(())
}

async fn run_export(options: ExportArgs) -> Result<()> {
    let config = load_config(&options.common)?;
    let controller = Controller::with_config(config)?;

    let summary = controller
        .export_dictionary(
            &options.output,
            &options.title,
            options.column.as_deref(),
            options.force,
        )
        .await?;
    println!("{}", summary);
    Ok(())
}

/// Load or create the configuration file, then apply the shared overrides
fn load_config(options: &ConfigArgs) -> Result<Config> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        serde_json::from_reader::<_, Config>(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    if let Some(path) = &options.database {
        config.database.path = path.clone();
    }
    if let Some(table) = &options.table {
        config.database.table = table.clone();
    }

    match &options.log_level {
        Some(log_level) => config.log_level = log_level.clone().into(),
        None => log::set_max_level(config.log_level.to_level_filter()),
    }

    Ok(config)
}
