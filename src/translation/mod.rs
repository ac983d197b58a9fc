/*!
 * Batch translation of pending rows.
 *
 * - `prompts`: numbered-list prompt building
 * - `client`: one request to the provider, with operator recovery on error replies
 * - `recovery`: the interactive credential/model dialogue
 * - `aligner`: mapping a reply back onto the batch's row ids
 * - `runner`: the fetch/send/align/persist loop
 * - `progress`: counters derived from the store
 * - `state`: model and credential currently in use
 */

pub use self::aligner::{AlignedResult, align};
pub use self::client::TranslationClient;
pub use self::progress::ProgressTracker;
pub use self::prompts::{PromptTemplate, TranslationPromptBuilder};
pub use self::recovery::{ConsolePrompt, OperatorPrompt, ScriptedPrompt};
pub use self::runner::{
    BatchRunner, FixedDelay, MAX_STALLED_BATCHES, RetryPolicy, RetryReason, RunSummary,
};
pub use self::state::RunState;

pub mod aligner;
pub mod client;
pub mod progress;
pub mod prompts;
pub mod recovery;
pub mod runner;
pub mod state;
