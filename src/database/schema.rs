/*!
 * Schema inspection for the translated table.
 *
 * Table and column names come from the operator's configuration, so they
 * are validated and quoted here before they are spliced into SQL. Values
 * never are: they always travel as bound parameters.
 */

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension};

use crate::errors::StoreError;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex is valid"));

/// Check that a configured name can be used as an SQL identifier
pub fn validate_identifier(name: &str) -> Result<(), StoreError> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Validate and double-quote an identifier
pub fn quote_identifier(name: &str) -> Result<String, StoreError> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Whether a table with this name exists
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool, StoreError> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Whether the table has a column with this name (case-insensitive, like SQLite)
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, StoreError> {
    let sql = format!("PRAGMA table_info({})", quote_identifier(table)?);
    let mut stmt = conn.prepare(&sql)?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for name in names {
        if name?.eq_ignore_ascii_case(column) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Add the destination column as nullable TEXT when it is absent
///
/// Returns `true` when the column was created. Calling it again is a no-op.
pub fn ensure_target_column(
    conn: &Connection,
    table: &str,
    column: &str,
) -> Result<bool, StoreError> {
    if !table_exists(conn, table)? {
        return Err(StoreError::MissingTable(table.to_string()));
    }

    if column_exists(conn, table, column)? {
        debug!("Column '{}' already present on '{}'", column, table);
        return Ok(false);
    }

    info!("Adding missing column '{}' to table '{}'", column, table);
    conn.execute(
        &format!(
            "ALTER TABLE {} ADD COLUMN {} TEXT",
            quote_identifier(table)?,
            quote_identifier(column)?
        ),
        [],
    )?;
    Ok(true)
}
