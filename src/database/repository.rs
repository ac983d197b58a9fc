/*!
 * Row store accessor.
 *
 * Counts, selects and updates rows of the configured table. A row is
 * pending while its target column is NULL or the empty string; the store
 * only ever moves rows from pending to done. Pending rows without any
 * source text are counted but never selected for translation.
 */

use anyhow::{Context, Result};
use log::debug;
use rusqlite::params;

use super::connection::DatabaseConnection;
use super::models::{PendingRow, StoreStatus, TranslatedRow};
use super::schema::{self, quote_identifier};
use crate::app_config::DatabaseConfig;
use crate::errors::StoreError;

/// Pre-quoted SQL for the configured table layout
#[derive(Debug, Clone)]
struct TableSql {
    count_all: String,
    count_pending: String,
    count_without_source: String,
    select_pending: String,
    update_target: String,
}

impl TableSql {
    fn new(layout: &DatabaseConfig) -> Result<Self, StoreError> {
        let table = quote_identifier(&layout.table)?;
        let id = quote_identifier(&layout.id_column)?;
        let source = quote_identifier(&layout.source_column)?;
        let target = quote_identifier(&layout.target_column)?;
        let pending = format!("({target} IS NULL OR {target} = '')");
        let blank_source = format!("({source} IS NULL OR trim({source}) = '')");

        Ok(Self {
            count_all: format!("SELECT COUNT(*) FROM {table}"),
            count_pending: format!("SELECT COUNT(*) FROM {table} WHERE {pending}"),
            count_without_source: format!(
                "SELECT COUNT(*) FROM {table} WHERE {pending} AND {blank_source}"
            ),
            select_pending: format!(
                "SELECT {id}, {source} FROM {table} WHERE {pending} AND NOT {blank_source} ORDER BY {id} ASC LIMIT ?1"
            ),
            update_target: format!("UPDATE {table} SET {target} = ?1 WHERE {id} = ?2"),
        })
    }
}

/// Accessor for the rows being translated
#[derive(Clone)]
pub struct RowStore {
    /// Database connection
    db: DatabaseConnection,
    /// Configured table and columns
    layout: DatabaseConfig,
    sql: TableSql,
}

impl RowStore {
    /// Create a store over the given connection and table layout
    pub fn new(db: DatabaseConnection, layout: DatabaseConfig) -> Result<Self> {
        let sql = TableSql::new(&layout)?;
        Ok(Self { db, layout, sql })
    }

    /// Open the configured database file
    pub fn open(layout: DatabaseConfig) -> Result<Self> {
        let db = DatabaseConnection::open(&layout.path)?;
        Self::new(db, layout)
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn layout(&self) -> &DatabaseConfig {
        &self.layout
    }

    /// Make sure the destination column exists; returns whether it was added
    pub async fn ensure_target_column(&self) -> Result<bool> {
        let table = self.layout.table.clone();
        let column = self.layout.target_column.clone();

        self.db
            .execute_async(move |conn| Ok(schema::ensure_target_column(conn, &table, &column)?))
            .await
    }

    /// Whether the destination column is already there; never alters the table
    pub async fn has_target_column(&self) -> Result<bool> {
        let table = self.layout.table.clone();
        let column = self.layout.target_column.clone();

        self.db
            .execute_async(move |conn| {
                if !schema::table_exists(conn, &table)? {
                    return Err(StoreError::MissingTable(table).into());
                }
                Ok(schema::column_exists(conn, &table, &column)?)
            })
            .await
    }

    /// Number of rows in the table
    pub async fn count_all(&self) -> Result<u64> {
        self.count(self.sql.count_all.clone()).await
    }

    /// Number of rows still waiting for a translation
    pub async fn count_pending(&self) -> Result<u64> {
        self.count(self.sql.count_pending.clone()).await
    }

    /// Pending rows that have nothing to translate
    pub async fn count_without_source(&self) -> Result<u64> {
        self.count(self.sql.count_without_source.clone()).await
    }

    /// Both counts in one call
    pub async fn status(&self) -> Result<StoreStatus> {
        let sql = self.sql.clone();

        self.db
            .execute_async(move |conn| {
                let total: i64 = conn.query_row(&sql.count_all, [], |row| row.get(0))?;
                let pending: i64 = conn.query_row(&sql.count_pending, [], |row| row.get(0))?;
                Ok(StoreStatus {
                    total: total.max(0) as u64,
                    pending: pending.max(0) as u64,
                })
            })
            .await
    }

    async fn count(&self, sql: String) -> Result<u64> {
        self.db
            .execute_async(move |conn| {
                let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
                Ok(count.max(0) as u64)
            })
            .await
    }

    /// Fetch up to `limit` pending rows with source text, ordered by ascending id
    pub async fn fetch_pending_batch(&self, limit: usize) -> Result<Vec<PendingRow>> {
        let sql = self.sql.select_pending.clone();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.db
            .execute_async(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params![limit], |row| {
                        Ok(PendingRow {
                            id: row.get(0)?,
                            source_text: row.get(1)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await
    }

    /// Write a batch of translations in one transaction
    ///
    /// Either every update is applied or none is. Text is bound as a
    /// statement parameter, so quotes in it can never end the statement.
    /// Returns the number of rows changed.
    pub async fn apply_translations(&self, rows: Vec<TranslatedRow>) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let sql = self.sql.update_target.clone();

        self.db
            .transaction_async(move |tx| {
                let mut stmt = tx.prepare(&sql)?;
                let mut changed = 0;
                for row in &rows {
                    let n = stmt
                        .execute(params![row.target_text, row.id])
                        .with_context(|| format!("Failed to update row {}", row.id))?;
                    if n == 0 {
                        debug!("Row {} no longer exists, skipping", row.id);
                    }
                    changed += n;
                }
                Ok(changed)
            })
            .await
    }
}
