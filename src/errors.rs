/*!
 * Error types for the rowlate application.
 *
 * This module contains custom error types for the different layers of the
 * application, using the thiserror crate for ergonomic error definitions.
 * Library code returns these; the binary wraps them in anyhow at the edge.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to the generation endpoint
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The request could not be completed at the transport level
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The response body could not be understood
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The endpoint answered with an error object
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },
}

impl ProviderError {
    /// Whether the operator has to change the credential or model before a retry
    pub fn needs_operator(&self) -> bool {
        matches!(self, Self::ApiError { .. })
    }
}

/// Errors that can occur while translating one batch
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The operator chose to quit during interactive recovery
    #[error("Translation aborted by operator")]
    Aborted,

    /// The call did not complete; the whole batch should be retried later
    #[error("Transient failure: {0}")]
    Transient(#[source] ProviderError),

    /// The operator input channel failed or was closed
    #[error("Operator prompt failed: {0}")]
    Prompt(String),
}

/// Errors raised by the row store
#[derive(Error, Debug)]
pub enum StoreError {
    /// A table or column name that cannot be used as an SQL identifier
    #[error("Invalid SQL identifier: '{0}'")]
    InvalidIdentifier(String),

    /// The configured table does not exist in the database
    #[error("Table '{0}' does not exist")]
    MissingTable(String),

    /// Any engine-level failure
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Errors raised while importing or exporting dictionary archives
#[derive(Error, Debug)]
pub enum DictionaryError {
    /// The output is already there and overwriting was not requested
    #[error("'{0}' already exists (use --force to overwrite)")]
    OutputExists(PathBuf),

    /// The file is not a readable zip archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// A bank file is not valid JSON or not a list of entries
    #[error("Invalid JSON in '{file}': {source}")]
    Json {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// A term entry does not have the expected shape
    #[error("Invalid entry #{index} in '{file}': {reason}")]
    InvalidEntry {
        file: String,
        index: usize,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or incomplete configuration; fatal at startup
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the row store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from a dictionary import or export
    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    /// A batch could not be committed; nothing from it was applied
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Several committed batches in a row left the pending count unchanged
    #[error("Translation stalled: {0}")]
    Stalled(String),

    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Whether this error came from the operator choosing to quit
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Translation(TranslationError::Aborted))
    }

    /// Recover a typed store error from an anyhow chain
    ///
    /// A missing table is a layout mistake, so it is reported as configuration.
    pub fn store(error: anyhow::Error) -> Self {
        match error.downcast::<StoreError>() {
            Ok(StoreError::MissingTable(table)) => Self::Config(format!(
                "Table '{}' does not exist in the database",
                table
            )),
            Ok(e) => Self::Store(e),
            Err(e) => Self::Unknown(format!("{:#}", e)),
        }
    }

    /// Recover a typed dictionary error from an anyhow chain
    pub fn dictionary(error: anyhow::Error) -> Self {
        match error.downcast::<DictionaryError>() {
            Ok(e) => Self::Dictionary(e),
            Err(e) => Self::store(e),
        }
    }
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
