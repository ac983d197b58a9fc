/*!
 * Yomitan term banks.
 *
 * A term bank is a JSON array of entries, each entry itself an array:
 *
 * ```text
 * [term, reading, definition tags, rules, score, [glossary...], sequence, term tags]
 * ```
 *
 * Only the first six fields matter here. Glossary items are joined with
 * [`DEFINITION_SEPARATOR`] into the single text column a dictionary table
 * holds, and split on it again on the way out.
 */

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::errors::DictionaryError;

/// Joins glossary items in the database column
pub const DEFINITION_SEPARATOR: &str = "; ";

/// Yomitan dictionary format written by the exporter
pub const FORMAT_VERSION: u32 = 3;

/// One dictionary row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEntry {
    pub word: String,
    pub reading: String,
    pub kind: String,
    pub definitions: String,
    pub priority: i64,
}

impl DictionaryEntry {
    /// Glossary items as stored in the definition column
    pub fn glossary(&self) -> Vec<&str> {
        self.definitions.split(DEFINITION_SEPARATOR).collect()
    }

    /// Build an entry from one term bank array
    fn from_json(entry: &Value, file: &str, index: usize) -> Result<Self, DictionaryError> {
        let invalid = |reason: &str| DictionaryError::InvalidEntry {
            file: file.to_string(),
            index,
            reason: reason.to_string(),
        };

        let fields = entry.as_array().ok_or_else(|| invalid("not an array"))?;
        if fields.len() < 6 {
            return Err(invalid("fewer than 6 fields"));
        }

        let text = |value: &Value, name: &str| -> Result<String, DictionaryError> {
            match value {
                Value::String(s) => Ok(s.clone()),
                Value::Null => Ok(String::new()),
                _ => Err(invalid(&format!("{} is not a string", name))),
            }
        };

        let priority = match &fields[4] {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .ok_or_else(|| invalid("score is out of range"))?,
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| invalid("score is not a number"))?,
            _ => return Err(invalid("score is not a number")),
        };

        let glossary: Vec<&str> = fields[5]
            .as_array()
            .ok_or_else(|| invalid("glossary is not an array"))?
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.as_str()),
                // structured content: keep its plain text, if any
                Value::Object(map) => map.get("text").and_then(Value::as_str),
                _ => None,
            })
            .collect();

        Ok(Self {
            word: text(&fields[0], "term")?,
            reading: text(&fields[1], "reading")?,
            kind: text(&fields[2], "definition tags")?,
            definitions: glossary.join(DEFINITION_SEPARATOR),
            priority,
        })
    }

    /// Term bank array for this entry; `sequence` numbers it within the export
    pub fn to_json(&self, sequence: i64) -> Value {
        json!([
            self.word,
            self.reading,
            self.kind,
            "",
            self.priority,
            self.glossary(),
            sequence,
            ""
        ])
    }
}

/// Parse the contents of one `term_bank_*.json` file
pub fn parse_term_bank(bytes: &[u8], file: &str) -> Result<Vec<DictionaryEntry>, DictionaryError> {
    let entries: Vec<Value> =
        serde_json::from_slice(bytes).map_err(|source| DictionaryError::Json {
            file: file.to_string(),
            source,
        })?;

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| DictionaryEntry::from_json(entry, file, index))
        .collect()
}

/// `index.json` of an archive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DictionaryIndex {
    pub title: String,
    pub format: u32,
    pub revision: String,
    #[serde(default)]
    pub sequenced: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
}

impl DictionaryIndex {
    /// Index for an export made now; the revision carries the local timestamp
    pub fn for_export(title: impl Into<String>) -> Self {
        let title = title.into();
        let revision = format!("db_export_{}", chrono::Local::now().format("%Y.%m.%d_%H%M%S"));

        Self {
            description: format!("Dictionary '{}' exported from an SQLite database.", title),
            title,
            format: FORMAT_VERSION,
            revision,
            sequenced: true,
            author: "rowlate".to_string(),
        }
    }
}
