/*!
 * Batch loop tests against a temporary SQLite file and a scripted provider
 */

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use rowlate::app_config::Config;
use rowlate::database::RowStore;
use rowlate::errors::AppError;
use rowlate::providers::mock::{MockProvider, MockReply};
use rowlate::translation::{
    BatchRunner, FixedDelay, MAX_STALLED_BATCHES, RunState, ScriptedPrompt, TranslationClient,
    TranslationPromptBuilder,
};

use crate::common::{self, TestDictionary};

/// Build a runner over the dictionary the same way the controller does
async fn runner_for(
    config: &Config,
    provider: MockProvider,
    prompt: ScriptedPrompt,
) -> Result<(BatchRunner, RunState)> {
    let store = RowStore::open(config.database.clone())?;
    store.ensure_target_column().await?;

    let client = TranslationClient::new(Arc::new(provider), Box::new(prompt));
    let prompts = TranslationPromptBuilder::new("English", "Russian");
    let runner = BatchRunner::new(store, client, prompts, config.translation.batch_size)
        .with_retry_policy(FixedDelay::immediate());

    Ok((runner, RunState::from_config(&config.translation)))
}

#[tokio::test]
async fn test_run_withFullReply_shouldTranslateEveryRow() -> Result<()> {
    common::init_logger();
    let dict = TestDictionary::with_sources(&["dog", "cat", "bird", "fish", "horse"])?;
    let reply = "1. собака\n2. кошка\n3. птица\n4. рыба\n5. лошадь";
    let mock = MockProvider::scripted(vec![MockReply::Text(reply.to_string())]);
    let (mut runner, mut state) =
        runner_for(&dict.config(), mock.clone(), ScriptedPrompt::default()).await?;

    let mut reported = Vec::new();
    let summary = runner.run(&mut state, |p| reported.push(p.percent())).await?;

    assert_eq!(summary.done, 5);
    assert_eq!(summary.remaining, 0);
    assert_eq!(summary.batches_committed, 1);
    assert_eq!(reported, vec![100]);
    assert_eq!(mock.call_count(), 1);

    let targets = dict.targets()?;
    assert_eq!(targets[0], (1, Some("собака".to_string())));
    assert_eq!(targets[4], (5, Some("лошадь".to_string())));
    Ok(())
}

#[tokio::test]
async fn test_run_withSmallBatches_shouldReportProgressAfterEachCommit() -> Result<()> {
    let dict = TestDictionary::with_sources(&["a", "b", "c", "d", "e"])?;
    let mut config = dict.config();
    config.translation.batch_size = 2;
    let mock = MockProvider::echo();
    let (mut runner, mut state) = runner_for(&config, mock.clone(), ScriptedPrompt::default()).await?;

    let mut reported = Vec::new();
    let summary = runner.run(&mut state, |p| reported.push((p.done, p.percent()))).await?;

    assert_eq!(reported, vec![(2, 40), (4, 80), (5, 100)]);
    assert_eq!(summary.batches_committed, 3);
    assert_eq!(mock.call_count(), 3);
    Ok(())
}

#[tokio::test]
async fn test_run_withShortReply_shouldKeepPrefixAndRefetchTheRest() -> Result<()> {
    let dict = TestDictionary::with_sources(&["alpha", "beta", "gamma"])?;
    let mock = MockProvider::scripted(vec![MockReply::Text("1. альфа\n2. бета".to_string())]);
    let (mut runner, mut state) =
        runner_for(&dict.config(), mock.clone(), ScriptedPrompt::default()).await?;

    let summary = runner.run(&mut state, |_| {}).await?;

    // The last line of a short reply is never trusted
    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].prompt.contains("1. alpha\n2. beta\n3. gamma"));
    assert!(calls[1].prompt.contains("1. beta\n2. gamma"));
    assert!(!calls[1].prompt.contains("alpha"));

    let targets = dict.targets()?;
    assert_eq!(targets[0].1.as_deref(), Some("альфа"));
    assert_eq!(targets[1].1.as_deref(), Some("[tr] beta"));
    assert_eq!(targets[2].1.as_deref(), Some("[tr] gamma"));
    assert_eq!(summary.rows_sacrificed, 1);
    assert_eq!(summary.rows_missing, 1);
    assert_eq!(summary.remaining, 0);
    Ok(())
}

#[tokio::test]
async fn test_run_afterApiError_shouldResendSamePromptWithNewCredential() -> Result<()> {
    let dict = TestDictionary::with_sources(&["one", "two"])?;
    let mock = MockProvider::scripted(vec![MockReply::ApiError("API key not valid".to_string())]);
    let prompt = ScriptedPrompt::new(["1", "fresh-key"]);
    let (mut runner, mut state) = runner_for(&dict.config(), mock.clone(), prompt).await?;

    let summary = runner.run(&mut state, |_| {}).await?;

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].prompt, calls[1].prompt);
    assert_eq!(calls[0].api_key, "test-key");
    assert_eq!(calls[1].api_key, "fresh-key");
    assert_eq!(state.api_key(), "fresh-key");
    assert_eq!(summary.done, 2);
    Ok(())
}

#[tokio::test]
async fn test_run_twice_shouldNotTouchTheStoreAgain() -> Result<()> {
    let dict = TestDictionary::with_sources(&["sun", "moon", "star"])?;
    let config = dict.config();

    let (mut runner, mut state) = runner_for(&config, MockProvider::echo(), ScriptedPrompt::default()).await?;
    runner.run(&mut state, |_| {}).await?;
    let after_first = dict.targets()?;

    let second = MockProvider::echo().with_echo_tag("[second]");
    let (mut runner, mut state) = runner_for(&config, second.clone(), ScriptedPrompt::default()).await?;
    let summary = runner.run(&mut state, |_| {}).await?;

    assert_eq!(second.call_count(), 0);
    assert_eq!(summary.batches_committed, 0);
    assert_eq!(summary.done, 3);
    assert_eq!(dict.targets()?, after_first);
    Ok(())
}

#[tokio::test]
async fn test_run_withQuotes_shouldRoundTripText() -> Result<()> {
    let dict = TestDictionary::with_sources(&[
        "It's fine",
        r#"He said "hi""#,
        "O'Brien'); DROP TABLE translations; --",
    ])?;
    let (mut runner, mut state) =
        runner_for(&dict.config(), MockProvider::echo(), ScriptedPrompt::default()).await?;

    runner.run(&mut state, |_| {}).await?;

    let targets: Vec<Option<String>> = dict.targets()?.into_iter().map(|(_, t)| t).collect();
    assert_eq!(
        targets,
        vec![
            Some("[tr] It's fine".to_string()),
            Some(r#"[tr] He said "hi""#.to_string()),
            Some("[tr] O'Brien'); DROP TABLE translations; --".to_string()),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_run_afterTransportFailure_shouldRetrySameBatch() -> Result<()> {
    let dict = TestDictionary::with_sources(&["red", "green"])?;
    let mock = MockProvider::scripted(vec![MockReply::Transport("connection reset".to_string())]);
    let prompt = ScriptedPrompt::default();
    let (mut runner, mut state) = runner_for(&dict.config(), mock.clone(), prompt).await?;

    let summary = runner.run(&mut state, |_| {}).await?;

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].prompt, calls[1].prompt);
    assert_eq!(summary.transient_failures, 1);
    assert_eq!(summary.done, 2);
    Ok(())
}

#[tokio::test]
async fn test_run_withUnusableReply_shouldDiscardAndRetry() -> Result<()> {
    let dict = TestDictionary::with_sources(&["left", "right", "up"])?;
    let mock = MockProvider::scripted(vec![
        MockReply::Text("I'm sorry, I can't help with that.".to_string()),
        MockReply::Text(String::new()),
    ]);
    let (mut runner, mut state) =
        runner_for(&dict.config(), mock.clone(), ScriptedPrompt::default()).await?;

    let summary = runner.run(&mut state, |_| {}).await?;

    assert_eq!(summary.discarded_responses, 2);
    assert_eq!(summary.batches_committed, 1);
    assert_eq!(mock.call_count(), 3);
    assert!(dict.targets()?.iter().all(|(_, t)| t.is_some()));
    Ok(())
}

#[tokio::test]
async fn test_run_whenOperatorQuits_shouldLeaveRowsPending() -> Result<()> {
    let dict = TestDictionary::with_sources(&["yes", "no"])?;
    let mock = MockProvider::scripted(vec![MockReply::ApiError("quota exceeded".to_string())]);
    let (mut runner, mut state) =
        runner_for(&dict.config(), mock.clone(), ScriptedPrompt::new(["3"])).await?;

    let result = runner.run(&mut state, |_| {}).await;

    assert!(result.is_err_and(|e| e.is_abort()));
    assert_eq!(mock.call_count(), 1);
    assert!(dict.targets()?.iter().all(|(_, t)| t.is_none()));
    Ok(())
}

#[tokio::test]
async fn test_run_withRowWithoutSource_shouldFinishAndReportIt() -> Result<()> {
    let dict = TestDictionary::with_optional_sources(&[Some("dog"), None, Some("  ")])?;
    let mock = MockProvider::scripted(vec![MockReply::Text("1. собака".to_string())]);
    let (mut runner, mut state) =
        runner_for(&dict.config(), mock.clone(), ScriptedPrompt::default()).await?;

    let summary = tokio::time::timeout(Duration::from_secs(5), runner.run(&mut state, |_| {}))
        .await
        .expect("run should finish")?;

    assert_eq!(mock.call_count(), 1);
    assert_eq!(mock.calls()[0].prompt.matches("1. dog").count(), 1);
    assert_eq!(summary.done, 1);
    assert_eq!(summary.remaining, 2);
    assert_eq!(summary.rows_without_source, 2);

    let targets = dict.targets()?;
    assert_eq!(targets[0].1.as_deref(), Some("собака"));
    assert_eq!(targets[1].1, None);
    assert_eq!(targets[2].1, None);
    Ok(())
}

#[tokio::test]
async fn test_run_withBlankTranslations_shouldStopAsStalled() -> Result<()> {
    let dict = TestDictionary::with_sources(&["dog"])?;
    let replies = (0..10).map(|_| MockReply::Text("1.".to_string())).collect();
    let mock = MockProvider::scripted(replies);
    let (mut runner, mut state) =
        runner_for(&dict.config(), mock.clone(), ScriptedPrompt::default()).await?;

    let result = tokio::time::timeout(Duration::from_secs(5), runner.run(&mut state, |_| {}))
        .await
        .expect("run should stop on its own");

    assert!(matches!(result, Err(AppError::Stalled(_))));
    assert_eq!(mock.call_count(), MAX_STALLED_BATCHES as usize);
    // an empty answer is never written as a translation
    assert_eq!(dict.targets()?, vec![(1, None)]);
    Ok(())
}

#[tokio::test]
async fn test_run_withStallLimitOfOne_shouldStopAfterFirstEmptyBatch() -> Result<()> {
    let dict = TestDictionary::with_sources(&["dog", "cat"])?;
    let mock = MockProvider::scripted(vec![MockReply::Text("1.\n2.".to_string())]);
    let (runner, mut state) =
        runner_for(&dict.config(), mock.clone(), ScriptedPrompt::default()).await?;
    let mut runner = runner.with_stall_limit(1);

    let result = runner.run(&mut state, |_| {}).await;

    assert!(matches!(result, Err(AppError::Stalled(_))));
    assert_eq!(mock.call_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_run_withOneBlankLine_shouldWriteTheRestAndKeepGoing() -> Result<()> {
    let dict = TestDictionary::with_sources(&["dog", "cat"])?;
    let mock = MockProvider::scripted(vec![MockReply::Text("1. собака\n2.".to_string())]);
    let (mut runner, mut state) =
        runner_for(&dict.config(), mock.clone(), ScriptedPrompt::default()).await?;

    let summary = runner.run(&mut state, |_| {}).await?;

    assert_eq!(summary.blank_translations, 1);
    assert_eq!(summary.remaining, 0);
    assert_eq!(mock.call_count(), 2);
    assert!(mock.calls()[1].prompt.contains("1. cat"));
    let targets = dict.targets()?;
    assert_eq!(targets[0].1.as_deref(), Some("собака"));
    assert_eq!(targets[1].1.as_deref(), Some("[tr] cat"));
    Ok(())
}
