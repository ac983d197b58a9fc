use anyhow::{Context, Result};
use log::{error, info, warn};
use rusqlite::params;
use std::fmt;
use std::path::{Path, PathBuf};

use super::archive::{self, TERM_BANK_CHUNK};
use super::term_bank::{DictionaryEntry, DictionaryIndex};
use crate::database::DatabaseConnection;
use crate::database::schema::quote_identifier;
use crate::errors::{DictionaryError, StoreError};

/// Table and columns a dictionary lives in
///
/// The definition column is the one the translator reads from (import) or
/// whichever column should be published (export).
#[derive(Debug, Clone)]
pub struct DictionaryTable {
    pub table: String,
    pub definition_column: String,
}

impl DictionaryTable {
    pub fn new(table: impl Into<String>, definition_column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            definition_column: definition_column.into(),
        }
    }

    fn quoted(&self) -> Result<(String, String), StoreError> {
        Ok((
            quote_identifier(&self.table)?,
            quote_identifier(&self.definition_column)?,
        ))
    }
}

/// What an import did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub archives_imported: usize,
    pub archives_failed: usize,
    pub archives_missing: usize,
    pub entries: u64,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries from {} archives ({} failed, {} not found)",
            self.entries, self.archives_imported, self.archives_failed, self.archives_missing
        )
    }
}

/// What an export did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub entries: u64,
    /// Rows whose definition column was empty
    pub skipped: u64,
    pub term_banks: usize,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries in {} term banks ({} rows without definitions skipped)",
            self.entries, self.term_banks, self.skipped
        )
    }
}

/// Remove `path` when `force` is set, refuse otherwise
fn clear_output(path: &Path, force: bool) -> Result<(), DictionaryError> {
    if !path.exists() {
        return Ok(());
    }
    if !force {
        return Err(DictionaryError::OutputExists(path.to_path_buf()));
    }
    std::fs::remove_file(path)?;
    info!("Removed existing {:?}", path);
    Ok(())
}

/// Build a fresh database at `db_path` from Yomitan archives
///
/// Each archive is imported in its own transaction: a broken archive is
/// rolled back and reported, and the next one is still imported. Missing
/// files are skipped with a warning. An index on `word` is created last.
pub async fn import_archives(
    db_path: &Path,
    archives: &[PathBuf],
    layout: &DictionaryTable,
    force: bool,
) -> Result<ImportSummary> {
    clear_output(db_path, force)?;
    let (table, column) = layout.quoted()?;

    let db = DatabaseConnection::create(db_path)?;
    let create_sql = format!(
        "CREATE TABLE {table} (word TEXT, reading TEXT, kind TEXT, {column} TEXT, priority INTEGER)"
    );
    db.execute_async(move |conn| {
        conn.execute_batch(&create_sql)
            .context("Failed to create dictionary table")?;
        Ok(())
    })
    .await?;

    let insert_sql = format!(
        "INSERT INTO {table} (word, reading, kind, {column}, priority) VALUES (?1, ?2, ?3, ?4, ?5)"
    );
    let mut summary = ImportSummary::default();

    for path in archives {
        if !path.is_file() {
            warn!("Archive not found, skipping: {:?}", path);
            summary.archives_missing += 1;
            continue;
        }

        info!("Importing {:?}", path);
        match import_one(&db, path.clone(), insert_sql.clone()).await {
            Ok(count) => {
                info!("Imported {} entries from {:?}", count, path);
                summary.archives_imported += 1;
                summary.entries += count;
            }
            Err(e) => {
                error!("Failed to import {:?}: {:#}", path, e);
                summary.archives_failed += 1;
            }
        }
    }

    let index_name = quote_identifier(&format!("{}_word_index", layout.table))?;
    let index_sql = format!("CREATE INDEX {index_name} ON {table}(word)");
    db.execute_async(move |conn| {
        conn.execute_batch(&index_sql)
            .context("Failed to create word index")?;
        Ok(())
    })
    .await?;

    info!("Import finished: {}", summary);
    Ok(summary)
}

async fn import_one(db: &DatabaseConnection, path: PathBuf, insert_sql: String) -> Result<u64> {
    let entries = tokio::task::spawn_blocking(move || archive::read_archive(&path))
        .await
        .context("Archive reader panicked")??;

    db.transaction_async(move |tx| {
        let mut stmt = tx.prepare(&insert_sql)?;
        for entry in &entries {
            stmt.execute(params![
                entry.word,
                entry.reading,
                entry.kind,
                entry.definitions,
                entry.priority
            ])?;
        }
        Ok(entries.len() as u64)
    })
    .await
}

/// Write the rows of an existing database as a Yomitan archive
///
/// Rows whose definition column is NULL or empty are left out, so exporting
/// a half-translated column only publishes finished rows.
pub async fn export_dictionary(
    db_path: &Path,
    output: &Path,
    title: &str,
    layout: &DictionaryTable,
    force: bool,
) -> Result<ExportSummary> {
    // the archive writer truncates an existing file
    if output.exists() && !force {
        return Err(DictionaryError::OutputExists(output.to_path_buf()).into());
    }
    let (table, column) = layout.quoted()?;

    let db = DatabaseConnection::open(db_path)?;
    let select_sql = format!(
        "SELECT coalesce(word, ''), coalesce(reading, ''), coalesce(kind, ''), {column}, coalesce(priority, 0) FROM {table} ORDER BY rowid"
    );
    let (entries, skipped) = db
        .execute_async(move |conn| {
            let mut stmt = conn
                .prepare(&select_sql)
                .context("Failed to read dictionary table")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;

            let mut entries = Vec::with_capacity(rows.len());
            let mut skipped = 0_u64;
            for (word, reading, kind, definitions, priority) in rows {
                match definitions.filter(|d| !d.trim().is_empty()) {
                    Some(definitions) => entries.push(DictionaryEntry {
                        word,
                        reading,
                        kind,
                        definitions,
                        priority,
                    }),
                    None => skipped += 1,
                }
            }
            Ok((entries, skipped))
        })
        .await?;

    let index = DictionaryIndex::for_export(title);
    let output_path = output.to_path_buf();
    let count = entries.len() as u64;
    let term_banks = tokio::task::spawn_blocking(move || {
        archive::write_archive(&output_path, &index, &entries, TERM_BANK_CHUNK)
    })
    .await
    .context("Archive writer panicked")??;

    let summary = ExportSummary {
        entries: count,
        skipped,
        term_banks,
    };
    info!("Exported {:?}: {}", output, summary);
    Ok(summary)
}
