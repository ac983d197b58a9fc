/*!
 * Yomitan import and export through the controller
 */

use anyhow::Result;
use indicatif::ProgressBar;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use rowlate::app_config::Config;
use rowlate::app_controller::Controller;
use rowlate::dictionary::read_archive;
use rowlate::errors::{AppError, DictionaryError};
use rowlate::providers::mock::MockProvider;
use rowlate::translation::{FixedDelay, ScriptedPrompt};

use crate::common::{self, write_zip};

const INDEX: &str = r#"{"title": "Test", "format": 3, "revision": "1"}"#;
const BANK_ONE: &str = r#"[["犬", "いぬ", "n", "", 10, ["dog", "hound"], 1, ""], ["猫", "ねこ", "n", "", 5, ["cat"], 2, ""]]"#;
const BANK_TWO: &str = r#"[["鳥", "とり", "n", "", 1, ["bird"], 3, ""]]"#;
// tag banks are not term entries and would not parse as such
const TAGS: &str = r#"[["n", "partOfSpeech", 0, "noun", 0]]"#;

fn config_for(dir: &Path) -> Config {
    let mut config = Config::default();
    config.database.path = dir.join("dict.db").to_string_lossy().into_owned();
    config.translation.api_key = "test-key".to_string();
    config
}

fn good_archive(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("good.zip");
    write_zip(
        &path,
        &[
            ("index.json", INDEX),
            ("tag_bank_1.json", TAGS),
            ("term_bank_1.json", BANK_ONE),
            ("term_bank_2.json", BANK_TWO),
        ],
    )?;
    Ok(path)
}

fn rows(db: &str) -> Result<Vec<(String, String, i64)>> {
    let conn = Connection::open(db)?;
    let mut stmt = conn.prepare("SELECT word, english, priority FROM translations ORDER BY rowid")?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[tokio::test]
async fn test_import_shouldSkipBrokenAndMissingArchives() -> Result<()> {
    common::init_logger();
    let dir = TempDir::new()?;
    let config = config_for(dir.path());
    let broken = dir.path().join("broken.zip");
    write_zip(&broken, &[("term_bank_1.json", "[[\"half")])?;
    let archives = vec![broken, dir.path().join("absent.zip"), good_archive(dir.path())?];

    let controller = Controller::with_config(config.clone())?;
    let summary = controller.import_dictionaries(&archives, false).await?;

    assert_eq!(summary.archives_imported, 1);
    assert_eq!(summary.archives_failed, 1);
    assert_eq!(summary.archives_missing, 1);
    assert_eq!(summary.entries, 3);
    assert_eq!(
        rows(&config.database.path)?,
        vec![
            ("犬".to_string(), "dog; hound".to_string(), 10),
            ("猫".to_string(), "cat".to_string(), 5),
            ("鳥".to_string(), "bird".to_string(), 1),
        ]
    );

    let conn = Connection::open(&config.database.path)?;
    let indexes: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND tbl_name = 'translations'",
        [],
        |row| row.get(0),
    )?;
    assert_eq!(indexes, 1);
    Ok(())
}

#[tokio::test]
async fn test_import_withExistingDatabase_shouldNeedForce() -> Result<()> {
    let dir = TempDir::new()?;
    let config = config_for(dir.path());
    std::fs::write(&config.database.path, b"precious")?;
    let archives = vec![good_archive(dir.path())?];
    let controller = Controller::with_config(config.clone())?;

    let result = controller.import_dictionaries(&archives, false).await;
    assert!(matches!(
        result,
        Err(AppError::Dictionary(DictionaryError::OutputExists(_)))
    ));
    assert_eq!(std::fs::read(&config.database.path)?, b"precious");

    let summary = controller.import_dictionaries(&archives, true).await?;
    assert_eq!(summary.entries, 3);
    assert_eq!(rows(&config.database.path)?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_importTranslateExport_shouldPublishTranslations() -> Result<()> {
    let dir = TempDir::new()?;
    let controller = Controller::with_config(config_for(dir.path()))?;
    controller
        .import_dictionaries(&[good_archive(dir.path())?], false)
        .await?;

    controller
        .run_with(
            Arc::new(MockProvider::echo()),
            Box::new(ScriptedPrompt::default()),
            FixedDelay::immediate(),
            ProgressBar::hidden(),
        )
        .await?;

    let output = dir.path().join("ru.zip");
    let summary = controller
        .export_dictionary(&output, "Test RU", None, false)
        .await?;
    assert_eq!(summary.entries, 3);
    assert_eq!(summary.term_banks, 1);

    let entries = read_archive(&output)?;
    assert_eq!(entries[0].word, "犬");
    assert_eq!(entries[0].reading, "いぬ");
    assert_eq!(entries[0].priority, 10);
    assert_eq!(entries[0].glossary(), vec!["[tr] dog", "hound"]);

    // the source column can be published as well
    let english = dir.path().join("en.zip");
    controller
        .export_dictionary(&english, "Test EN", Some("english"), false)
        .await?;
    assert_eq!(read_archive(&english)?[2].definitions, "bird");
    Ok(())
}

#[tokio::test]
async fn test_export_withExistingArchive_shouldNeedForce() -> Result<()> {
    let dir = TempDir::new()?;
    let controller = Controller::with_config(config_for(dir.path()))?;
    controller
        .import_dictionaries(&[good_archive(dir.path())?], false)
        .await?;
    let output = dir.path().join("out.zip");
    std::fs::write(&output, b"old")?;

    let result = controller
        .export_dictionary(&output, "T", Some("english"), false)
        .await;
    assert!(matches!(
        result,
        Err(AppError::Dictionary(DictionaryError::OutputExists(_)))
    ));
    assert_eq!(std::fs::read(&output)?, b"old");

    controller
        .export_dictionary(&output, "T", Some("english"), true)
        .await?;
    assert_eq!(read_archive(&output)?.len(), 3);
    Ok(())
}
