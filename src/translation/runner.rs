/*!
 * Batch loop.
 *
 * Repeats fetch → prompt → send → align → persist until no pending row is
 * left. Every step is awaited in turn, so there is never more than one
 * request or transaction in flight. Nothing is checkpointed: the pending
 * set is a query over the store, which makes an interrupted run resumable
 * by simply starting it again.
 *
 * Empty translations are never written. A run whose batches keep
 * producing nothing to write stops after [`MAX_STALLED_BATCHES`] cycles in
 * a row instead of asking for the same rows forever.
 */

use log::{debug, info, warn};
use std::fmt;
use std::time::Duration;

use super::aligner::{AlignedResult, align};
use super::client::TranslationClient;
use super::progress::ProgressTracker;
use super::prompts::TranslationPromptBuilder;
use super::state::RunState;
use crate::database::{RowId, RowStore, StoreStatus};
use crate::errors::{AppError, TranslationError};

/// Consecutive batches without progress before the run gives up
pub const MAX_STALLED_BATCHES: u32 = 3;

/// Why the loop is about to wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// The request did not complete
    Transport,
    /// The reply had nothing usable
    Discarded,
    /// A batch was committed and the next one follows
    BatchCommitted,
}

/// Pacing of the loop
pub trait RetryPolicy: Send + Sync {
    fn delay(&self, reason: RetryReason) -> Duration;
}

/// Fixed delays: one for retries, one between committed batches
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    pub retry: Duration,
    pub between_batches: Duration,
}

impl FixedDelay {
    pub fn new(retry: Duration, between_batches: Duration) -> Self {
        Self {
            retry,
            between_batches,
        }
    }

    /// No waiting at all (tests, local mocks)
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(1))
    }
}

impl RetryPolicy for FixedDelay {
    fn delay(&self, reason: RetryReason) -> Duration {
        match reason {
            RetryReason::Transport | RetryReason::Discarded => self.retry,
            RetryReason::BatchCommitted => self.between_batches,
        }
    }
}

/// Where the loop is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Measuring,
    Cycling,
    Done,
}

/// Outcome of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: u64,
    pub done: u64,
    pub remaining: u64,
    pub batches_committed: u64,
    pub rows_written: u64,
    /// One per partial reply whose untrusted last line belonged to a row
    pub rows_sacrificed: u64,
    /// Rows a partial reply had no line for at all
    pub rows_missing: u64,
    /// Lines that came back empty; their rows stay pending
    pub blank_translations: u64,
    /// Pending rows skipped because their source text is empty
    pub rows_without_source: u64,
    pub transient_failures: u64,
    pub discarded_responses: u64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} rows translated, {} remaining; {} batches committed ({} rows written, {} sacrificed, {} missing, {} blank), {} without source, {} transport failures, {} discarded responses",
            self.done,
            self.total,
            self.remaining,
            self.batches_committed,
            self.rows_written,
            self.rows_sacrificed,
            self.rows_missing,
            self.blank_translations,
            self.rows_without_source,
            self.transient_failures,
            self.discarded_responses
        )
    }
}

/// Drives batches until the table has no pending rows
pub struct BatchRunner {
    store: RowStore,
    client: TranslationClient,
    prompts: TranslationPromptBuilder,
    batch_size: usize,
    retry: Box<dyn RetryPolicy>,
    stall_limit: u32,
    phase: RunPhase,
}

impl BatchRunner {
    pub fn new(
        store: RowStore,
        client: TranslationClient,
        prompts: TranslationPromptBuilder,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            client,
            prompts,
            batch_size: batch_size.max(1),
            retry: Box::new(FixedDelay::default()),
            stall_limit: MAX_STALLED_BATCHES,
            phase: RunPhase::Measuring,
        }
    }

    pub fn with_retry_policy(mut self, retry: impl RetryPolicy + 'static) -> Self {
        self.retry = Box::new(retry);
        self
    }

    /// Give up after `limit` batches in a row that move no row to done
    pub fn with_stall_limit(mut self, limit: u32) -> Self {
        self.stall_limit = limit.max(1);
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    /// Run until done
    ///
    /// `on_progress` is called after every committed batch. Transport
    /// failures and unusable replies are retried; a run that stops making
    /// progress ends with [`AppError::Stalled`]; anything else ends the run.
    pub async fn run<F>(&mut self, run: &mut RunState, mut on_progress: F) -> Result<RunSummary, AppError>
    where
        F: FnMut(&ProgressTracker) + Send,
    {
        self.phase = RunPhase::Measuring;
        let status = measure(&self.store).await?;
        run.progress = ProgressTracker::from_status(status);
        let mut summary = RunSummary::default();
        let mut stalled = 0;

        info!("{}", run.progress);
        self.phase = if status.pending == 0 {
            RunPhase::Done
        } else {
            RunPhase::Cycling
        };

        while self.phase == RunPhase::Cycling {
            let batch = self
                .store
                .fetch_pending_batch(self.batch_size)
                .await
                .map_err(AppError::store)?;
            if batch.is_empty() {
                self.phase = RunPhase::Done;
                break;
            }

            debug!("Fetched {} pending rows", batch.len());
            let prompt = self.prompts.build(&batch);

            let raw = match self.client.send(run, &prompt).await {
                Ok(raw) => raw,
                Err(TranslationError::Transient(e)) => {
                    summary.transient_failures += 1;
                    let delay = self.retry.delay(RetryReason::Transport);
                    warn!("Request failed ({}), retrying batch in {:?}", e, delay);
                    sleep(delay).await;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let ids: Vec<RowId> = batch.iter().map(|row| row.id.clone()).collect();
            let pairs = match align(&raw, &ids) {
                AlignedResult::Full { pairs } => pairs,
                AlignedResult::Partial {
                    pairs,
                    diagnostic_tail,
                } => {
                    warn!(
                        "Expected {} lines, reply did not match; keeping the first {}",
                        ids.len(),
                        pairs.len()
                    );
                    warn!("Last reply lines: {:?}", diagnostic_tail);
                    let left = (ids.len() - pairs.len()) as u64;
                    let sacrificed = left.min(1);
                    summary.rows_sacrificed += sacrificed;
                    summary.rows_missing += left - sacrificed;
                    pairs
                }
                AlignedResult::Discarded => {
                    summary.discarded_responses += 1;
                    let delay = self.retry.delay(RetryReason::Discarded);
                    warn!("Reply had no usable lines, retrying batch in {:?}", delay);
                    debug!("Discarded reply: {:?}", raw);
                    sleep(delay).await;
                    continue;
                }
            };

            let (pairs, blank): (Vec<_>, Vec<_>) = pairs
                .into_iter()
                .partition(|pair| !pair.target_text.is_empty());
            if !blank.is_empty() {
                summary.blank_translations += blank.len() as u64;
                warn!("{} lines came back empty, leaving those rows pending", blank.len());
            }

            let advanced = if pairs.is_empty() {
                0
            } else {
                let written = pairs.len() as u64;
                self.store
                    .apply_translations(pairs)
                    .await
                    .map_err(|e| AppError::Persistence(format!("{:#}", e)))?;
                summary.batches_committed += 1;
                summary.rows_written += written;

                let status = measure(&self.store).await?;
                let advanced = run.progress.update(status);
                info!("{}", run.progress);
                on_progress(&run.progress);
                advanced
            };

            if advanced == 0 {
                stalled += 1;
                warn!(
                    "Batch did not reduce the pending count ({} of {} allowed in a row)",
                    stalled, self.stall_limit
                );
                if stalled >= self.stall_limit {
                    return Err(AppError::Stalled(format!(
                        "{} batches in a row translated nothing; {}",
                        stalled, run.progress
                    )));
                }
            } else {
                stalled = 0;
            }

            if run.progress.is_complete() {
                self.phase = RunPhase::Done;
            } else {
                sleep(self.retry.delay(RetryReason::BatchCommitted)).await;
            }
        }

        summary.rows_without_source = self
            .store
            .count_without_source()
            .await
            .map_err(AppError::store)?;
        if summary.rows_without_source > 0 {
            warn!(
                "{} pending rows have no source text and were left untouched",
                summary.rows_without_source
            );
        }

        summary.total = run.progress.total;
        summary.done = run.progress.done;
        summary.remaining = run.progress.remaining;
        Ok(summary)
    }
}

async fn measure(store: &RowStore) -> Result<StoreStatus, AppError> {
    store.status().await.map_err(AppError::store)
}

async fn sleep(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
