use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::time::Duration;
use url::Url;

use crate::database::schema::validate_identifier;

/// Application configuration module
/// This module handles the run configuration: where the rows live, which
/// endpoint and model translate them, and how the batch loop paces itself.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language (ISO code or free-text label)
    pub source_language: String,

    /// Target language (ISO code or free-text label)
    pub target_language: String,

    /// Row store settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Location and shape of the table being translated
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Table holding the rows
    #[serde(default = "default_table")]
    pub table: String,

    /// Stable unique row identifier
    #[serde(default = "default_id_column")]
    pub id_column: String,

    /// Column with the text to translate
    #[serde(default = "default_source_column")]
    pub source_column: String,

    /// Column receiving translations; created when missing
    #[serde(default = "default_target_column")]
    pub target_column: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            table: default_table(),
            id_column: default_id_column(),
            source_column: default_source_column(),
            target_column: default_target_column(),
        }
    }
}

/// Remote endpoint and batch loop settings
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationConfig {
    /// Base URL; requests go to `<endpoint>/<model>:generateContent`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model used when the run starts
    #[serde(default = "default_model")]
    pub model: String,

    /// Models the operator may switch to during recovery
    #[serde(default = "default_available_models")]
    pub available_models: Vec<String>,

    /// API credential
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Maximum rows per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Delay before retrying a batch after a transport failure or unusable response
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Delay between two committed batches
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Request timeout in seconds; no timeout when absent
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            available_models: default_available_models(),
            api_key: String::new(),
            batch_size: default_batch_size(),
            retry_delay_ms: default_retry_delay_ms(),
            batch_delay_ms: default_batch_delay_ms(),
            timeout_secs: None,
        }
    }
}

impl TranslationConfig {
    /// Delay applied before a batch is retried
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Delay applied after a committed batch
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Position of the configured model in the allow-list
    pub fn model_index(&self) -> Option<usize> {
        self.available_models.iter().position(|m| m == &self.model)
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_database_path() -> String {
    "dict.db".to_string()
}

fn default_table() -> String {
    "translations".to_string()
}

fn default_id_column() -> String {
    "rowid".to_string()
}

fn default_source_column() -> String {
    "english".to_string()
}

fn default_target_column() -> String {
    "russian".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_available_models() -> Vec<String> {
    vec![
        "gemini-2.0-flash".to_string(),
        "gemini-2.0-flash-lite".to_string(),
        "gemini-1.5-flash".to_string(),
        "gemini-1.5-pro".to_string(),
    ]
}

fn default_batch_size() -> usize {
    50
}

fn default_retry_delay_ms() -> u64 {
    5000
}

fn default_batch_delay_ms() -> u64 {
    1000
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.source_language.trim().is_empty() {
            return Err(anyhow!("Source language must not be empty"));
        }
        if self.target_language.trim().is_empty() {
            return Err(anyhow!("Target language must not be empty"));
        }

        let db = &self.database;
        if db.path.trim().is_empty() {
            return Err(anyhow!("Database path must not be empty"));
        }
        for name in [&db.table, &db.id_column, &db.source_column, &db.target_column] {
            validate_identifier(name)?;
        }
        if db.source_column == db.target_column {
            return Err(anyhow!(
                "Source and target columns must differ (both are '{}')",
                db.source_column
            ));
        }

        let tr = &self.translation;
        Url::parse(&tr.endpoint)
            .map_err(|e| anyhow!("Invalid endpoint URL '{}': {}", tr.endpoint, e))?;
        if tr.batch_size == 0 {
            return Err(anyhow!("Batch size must be greater than zero"));
        }
        if tr.available_models.is_empty() {
            return Err(anyhow!("At least one selectable model is required"));
        }
        if tr.model_index().is_none() {
            return Err(anyhow!(
                "Model '{}' is not in the list of available models",
                tr.model
            ));
        }
        if tr.api_key.trim().is_empty() {
            return Err(anyhow!("Translation API key is required"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: "en".to_string(),
            target_language: "ru".to_string(),
            database: DatabaseConfig::default(),
            translation: TranslationConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
