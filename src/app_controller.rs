use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::database::{RowStore, StoreStatus};
use crate::dictionary::{self, DictionaryTable, ExportSummary, ImportSummary};
use crate::errors::AppError;
use crate::language_utils;
use crate::providers::Provider;
use crate::providers::gemini::Gemini;
use crate::translation::{
    BatchRunner, ConsolePrompt, FixedDelay, OperatorPrompt, RetryPolicy, RunState, RunSummary,
    TranslationClient, TranslationPromptBuilder,
};

// @module: Application controller for table translation

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate every pending row against the configured endpoint
    ///
    /// Operator dialogues read from stdin; the progress bar is hidden while
    /// a question is on screen.
    pub async fn run(&self) -> Result<RunSummary, AppError> {
        let tr = &self.config.translation;
        let timeout = tr.timeout_secs.map(Duration::from_secs);
        let gemini = Gemini::new(tr.endpoint.clone(), timeout)
            .map_err(|e| AppError::Config(format!("Cannot set up the endpoint client: {}", e)))?;
        let provider: Arc<dyn Provider> = Arc::new(gemini);

        let progress_bar = Self::create_progress_bar();
        let prompt = ConsolePrompt::new().with_progress_bar(progress_bar.clone());
        let retry = FixedDelay::new(tr.retry_delay(), tr.batch_delay());

        self.run_with(provider, Box::new(prompt), retry, progress_bar)
            .await
    }

    /// Same as [`run`](Self::run) with every collaborator supplied by the caller
    pub async fn run_with(
        &self,
        provider: Arc<dyn Provider>,
        prompt: Box<dyn OperatorPrompt>,
        retry: impl RetryPolicy + 'static,
        progress_bar: ProgressBar,
    ) -> Result<RunSummary, AppError> {
        let start_time = Instant::now();
        let store = self.open_store()?;

        if store
            .ensure_target_column()
            .await
            .map_err(AppError::store)?
        {
            info!(
                "Created column '{}' on '{}'",
                self.config.database.target_column, self.config.database.table
            );
        }

        let source_label = language_utils::language_label(&self.config.source_language)
            .map_err(|e| AppError::Config(e.to_string()))?;
        let target_label = language_utils::language_label(&self.config.target_language)
            .map_err(|e| AppError::Config(e.to_string()))?;

        let mut run_state = RunState::from_config(&self.config.translation);
        info!(
            "🚀 Rowlate: {} -> {} with {} ({} rows per batch)",
            source_label,
            target_label,
            run_state.model(),
            self.config.translation.batch_size
        );

        let status = store.status().await.map_err(AppError::store)?;
        progress_bar.set_length(status.total);
        progress_bar.set_position(status.done());

        let client = TranslationClient::new(provider, prompt);
        let prompts = TranslationPromptBuilder::new(&source_label, &target_label);
        let mut runner = BatchRunner::new(store, client, prompts, self.config.translation.batch_size)
            .with_retry_policy(retry);

        let result = runner
            .run(&mut run_state, |progress| {
                progress_bar.set_length(progress.total);
                progress_bar.set_position(progress.done);
                progress_bar.set_message(format!("{} remaining", progress.remaining));
            })
            .await;

        match &result {
            Ok(summary) => {
                progress_bar.finish_and_clear();
                info!(
                    "Run finished in {}: {}",
                    Self::format_duration(start_time.elapsed()),
                    summary
                );
            }
            Err(e) if e.is_abort() => {
                progress_bar.abandon();
                warn!(
                    "Stopped by operator after {}: {}",
                    Self::format_duration(start_time.elapsed()),
                    run_state.progress
                );
            }
            Err(_) => progress_bar.abandon(),
        }

        result
    }

    /// Read the current counts without touching the table
    ///
    /// A missing target column means nothing has been translated yet.
    pub async fn status(&self) -> Result<StoreStatus, AppError> {
        let store = self.open_store()?;

        if store.has_target_column().await.map_err(AppError::store)? {
            store.status().await.map_err(AppError::store)
        } else {
            let total = store.count_all().await.map_err(AppError::store)?;
            Ok(StoreStatus {
                total,
                pending: total,
            })
        }
    }

    /// Build the configured database from Yomitan archives
    ///
    /// Definitions land in the configured source column, ready to translate.
    pub async fn import_dictionaries(
        &self,
        archives: &[PathBuf],
        force: bool,
    ) -> Result<ImportSummary, AppError> {
        let db = &self.config.database;
        let layout = DictionaryTable::new(&db.table, &db.source_column);

        dictionary::import_archives(Path::new(&db.path), archives, &layout, force)
            .await
            .map_err(AppError::dictionary)
    }

    /// Write one column of the configured table as a Yomitan archive
    ///
    /// `column` defaults to the target column, so a plain export publishes
    /// the translations.
    pub async fn export_dictionary(
        &self,
        output: &Path,
        title: &str,
        column: Option<&str>,
        force: bool,
    ) -> Result<ExportSummary, AppError> {
        let db = &self.config.database;
        let column = column.unwrap_or(&db.target_column);
        let layout = DictionaryTable::new(&db.table, column);

        dictionary::export_dictionary(Path::new(&db.path), output, title, &layout, force)
            .await
            .map_err(AppError::dictionary)
    }

    /// Selectable models, default first marker included
    pub fn model_listing(&self) -> Vec<String> {
        let tr = &self.config.translation;
        tr.available_models
            .iter()
            .enumerate()
            .map(|(idx, model)| {
                let marker = if *model == tr.model { " (default)" } else { "" };
                format!("[{}] {}{}", idx, model, marker)
            })
            .collect()
    }

    fn open_store(&self) -> Result<RowStore, AppError> {
        RowStore::open(self.config.database.clone()).map_err(|e| match AppError::store(e) {
            AppError::Unknown(message) => AppError::Config(message),
            other => other,
        })
    }

    fn create_progress_bar() -> ProgressBar {
        let progress_bar = ProgressBar::new(0);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));
        progress_bar
    }

    // @returns: Duration formatted as "1h 2m 3s", "2m 3s" or "3s"
    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
