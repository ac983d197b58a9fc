/*!
 * Data models for rows read from and written to the store.
 */

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::fmt;

/// Primary key of a row
///
/// Identifiers are opaque: they are only used to address rows, never
/// interpreted. Integer and text keys both round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowId {
    Integer(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(id) => write!(f, "{}", id),
            Self::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for RowId {
    fn from(id: i64) -> Self {
        Self::Integer(id)
    }
}

impl From<&str> for RowId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl ToSql for RowId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Self::Integer(id) => id.to_sql(),
            Self::Text(id) => id.to_sql(),
        }
    }
}

impl FromSql for RowId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(id) => Ok(Self::Integer(id)),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map(|s| Self::Text(s.to_string()))
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A pending row as fetched for one batch
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRow {
    pub id: RowId,
    pub source_text: String,
}

impl PendingRow {
    pub fn new(id: impl Into<RowId>, source_text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_text: source_text.into(),
        }
    }
}

/// A translation ready to be written back
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedRow {
    pub id: RowId,
    pub target_text: String,
}

/// Row counts for the configured table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatus {
    pub total: u64,
    pub pending: u64,
}

impl StoreStatus {
    pub fn done(&self) -> u64 {
        self.total.saturating_sub(self.pending)
    }

    /// Completion percentage, integer division; an empty table counts as complete
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            return 100;
        }
        self.done() * 100 / self.total
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total: {}, Pending: {}, Done: {} ({}%)",
            self.total,
            self.pending,
            self.done(),
            self.percent()
        )
    }
}
