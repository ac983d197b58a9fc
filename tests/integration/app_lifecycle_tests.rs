/*!
 * Integration tests for application lifecycle
 */

use anyhow::Result;
use indicatif::ProgressBar;
use rusqlite::Connection;
use std::sync::Arc;

use rowlate::app_controller::Controller;
use rowlate::errors::AppError;
use rowlate::providers::mock::MockProvider;
use rowlate::translation::{FixedDelay, ScriptedPrompt};

use crate::common::{self, TestDictionary};

/// Test a full run through the controller with a scripted provider
#[tokio::test]
async fn test_controller_runWith_shouldCreateColumnAndTranslate() -> Result<()> {
    common::init_logger();
    let dict = TestDictionary::with_sources(&["water", "fire"])?;
    let controller = Controller::with_config(dict.config())?;
    let mock = MockProvider::echo();

    let summary = controller
        .run_with(
            Arc::new(mock.clone()),
            Box::new(ScriptedPrompt::default()),
            FixedDelay::immediate(),
            ProgressBar::hidden(),
        )
        .await?;

    assert_eq!(summary.total, 2);
    assert_eq!(summary.remaining, 0);
    assert!(mock.calls()[0].prompt.starts_with("Translate the following numbered lines from English to Russian."));
    assert_eq!(dict.targets()?[1].1.as_deref(), Some("[tr] fire"));
    Ok(())
}

/// Test status before and after a run
#[tokio::test]
async fn test_controller_status_shouldNotAlterTable() -> Result<()> {
    let dict = TestDictionary::with_sources(&["a", "b", "c"])?;
    let controller = Controller::with_config(dict.config())?;

    let before = controller.status().await?;
    assert_eq!((before.total, before.pending), (3, 3));
    // The target column is still missing
    assert!(dict.targets().is_err());

    controller
        .run_with(
            Arc::new(MockProvider::echo()),
            Box::new(ScriptedPrompt::default()),
            FixedDelay::immediate(),
            ProgressBar::hidden(),
        )
        .await?;

    let after = controller.status().await?;
    assert_eq!((after.total, after.pending), (3, 0));
    assert_eq!(after.percent(), 100);
    Ok(())
}

/// Test that a wrong table name is reported as configuration
#[tokio::test]
async fn test_controller_withMissingTable_shouldFailWithConfigError() -> Result<()> {
    let dict = TestDictionary::with_sources(&["a"])?;
    let mut config = dict.config();
    config.database.table = "words".to_string();
    let controller = Controller::with_config(config)?;

    let result = controller
        .run_with(
            Arc::new(MockProvider::echo()),
            Box::new(ScriptedPrompt::default()),
            FixedDelay::immediate(),
            ProgressBar::hidden(),
        )
        .await;

    assert!(matches!(result, Err(AppError::Config(_))));
    Ok(())
}

/// Test that a missing database file is never created
#[tokio::test]
async fn test_controller_withMissingDatabase_shouldFailWithoutCreatingIt() -> Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("absent.db");
    let mut config = rowlate::Config::default();
    config.database.path = path.to_string_lossy().into_owned();
    let controller = Controller::with_config(config)?;

    let result = controller.status().await;

    assert!(matches!(result, Err(AppError::Config(_))));
    assert!(!path.exists());
    Ok(())
}

/// Test that a failing update rolls back the whole batch
#[tokio::test]
async fn test_controller_whenCommitFails_shouldApplyNothingAndStop() -> Result<()> {
    let dict = TestDictionary::with_sources(&["one", "two", "three"])?;
    {
        let conn = Connection::open(&dict.path)?;
        conn.execute_batch(
            "CREATE TRIGGER reject_second BEFORE UPDATE ON translations
             WHEN NEW.rowid = 2
             BEGIN SELECT RAISE(ABORT, 'row 2 is locked'); END;",
        )?;
    }
    let controller = Controller::with_config(dict.config())?;
    let mock = MockProvider::echo();

    let result = controller
        .run_with(
            Arc::new(mock.clone()),
            Box::new(ScriptedPrompt::default()),
            FixedDelay::immediate(),
            ProgressBar::hidden(),
        )
        .await;

    assert!(matches!(result, Err(AppError::Persistence(_))));
    assert_eq!(mock.call_count(), 1);
    assert!(dict.targets()?.iter().all(|(_, t)| t.is_none()));
    Ok(())
}
