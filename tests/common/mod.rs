/*!
 * Common test utilities for the rowlate test suite
 */

use anyhow::Result;
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;

use rowlate::app_config::Config;

static INIT_LOGGER: Once = Once::new();

/// Route library logs through env_logger (RUST_LOG=debug cargo test)
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// A dictionary database in a temporary directory
pub struct TestDictionary {
    // Keeps the directory alive for the duration of the test
    _dir: TempDir,
    pub path: PathBuf,
}

impl TestDictionary {
    /// Create `translations(word, reading, kind, english, priority)` holding `sources`
    pub fn with_sources(sources: &[&str]) -> Result<Self> {
        let sources: Vec<Option<&str>> = sources.iter().copied().map(Some).collect();
        Self::with_optional_sources(&sources)
    }

    /// Same as [`with_sources`](Self::with_sources), `None` stored as NULL
    pub fn with_optional_sources(sources: &[Option<&str>]) -> Result<Self> {
        let dir = TempDir::new()?;
        let path = dir.path().join("dict.db");

        let conn = Connection::open(&path)?;
        conn.execute_batch(
            "CREATE TABLE translations (word TEXT, reading TEXT, kind TEXT, english TEXT, priority INTEGER)",
        )?;
        for (i, text) in sources.iter().enumerate() {
            conn.execute(
                "INSERT INTO translations (word, reading, kind, english, priority) VALUES (?1, ?2, 'n', ?3, 0)",
                params![format!("w{}", i + 1), format!("r{}", i + 1), text],
            )?;
        }

        Ok(Self { _dir: dir, path })
    }

    /// Configuration pointing at this database, ready to validate
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.database.path = self.path.to_string_lossy().into_owned();
        config.translation.api_key = "test-key".to_string();
        config.translation.batch_size = 50;
        config
    }

    /// Current `(rowid, russian)` pairs, ordered by rowid
    pub fn targets(&self) -> Result<Vec<(i64, Option<String>)>> {
        read_targets(&self.path)
    }
}

fn read_targets(path: &Path) -> Result<Vec<(i64, Option<String>)>> {
    let conn = Connection::open(path)?;
    let mut stmt = conn.prepare("SELECT rowid, russian FROM translations ORDER BY rowid")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Write a zip archive holding `members` as `(name, contents)` pairs
pub fn write_zip(path: &Path, members: &[(&str, &str)]) -> Result<()> {
    let mut zip = zip::ZipWriter::new(std::fs::File::create(path)?);
    let options = zip::write::FileOptions::default();
    for (name, contents) in members {
        zip.start_file(*name, options)?;
        std::io::Write::write_all(&mut zip, contents.as_bytes())?;
    }
    zip.finish()?;
    Ok(())
}
