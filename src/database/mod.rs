/*!
 * Database module for the table being translated.
 *
 * This module provides SQLite access for:
 * - Opening the operator's database file
 * - Adding the destination column when it is missing
 * - Counting, selecting and transactionally updating rows
 */

pub mod connection;
pub mod models;
pub mod repository;
pub mod schema;

// Re-export main types
pub use connection::DatabaseConnection;
pub use models::{PendingRow, RowId, StoreStatus, TranslatedRow};
pub use repository::RowStore;
