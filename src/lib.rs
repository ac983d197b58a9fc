/*!
 * # Rowlate - batch translation of SQLite rows
 *
 * A Rust library for filling a translation column of an SQLite table with
 * the help of a remote text-generation endpoint.
 *
 * ## Features
 *
 * - Resumable runs: a row is pending while its target column is empty
 * - Numbered-list prompts, positional alignment of the reply
 * - Each batch committed in a single transaction
 * - Interactive recovery (new credential or model) on endpoint errors
 * - Yomitan dictionary import into, and export from, the database
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `database`: Row store over the configured table
 * - `dictionary`: Yomitan archive import and export
 * - `translation`: Prompt building, recovery, alignment and the batch loop
 * - `providers`: Generation endpoint clients:
 *   - `providers::gemini`: `generateContent` REST client
 *   - `providers::mock`: scripted provider for tests
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod database;
pub mod dictionary;
pub mod errors;
pub mod language_utils;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use database::{RowId, RowStore, StoreStatus};
pub use errors::{AppError, DictionaryError, ProviderError, StoreError, TranslationError};
pub use language_utils::language_label;
pub use translation::{BatchRunner, RunSummary};
