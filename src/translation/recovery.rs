/*!
 * Interactive recovery after an error reply from the endpoint.
 *
 * Retrying with the same credential and model would only repeat the
 * failure, so the operator has to change one of them or quit:
 *
 * ```text
 * AwaitingChoice --1--> AwaitingCredential --new key---> Retrying
 *                --2--> AwaitingModel ------other model--> Retrying
 *                --3--> Aborted
 * ```
 *
 * Invalid input, including the key or model that just failed, keeps the
 * machine in its current state and asks again.
 * Closed input aborts.
 */

use log::{error, info, warn};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

use super::state::RunState;
use crate::errors::{ProviderError, TranslationError};

/// Source of operator answers
pub trait OperatorPrompt: Send {
    /// Show `message` and read one line; `Ok(None)` once input is closed
    fn ask(&mut self, message: &str) -> io::Result<Option<String>>;
}

/// Reads answers from stdin
#[derive(Default)]
pub struct ConsolePrompt {
    progress_bar: Option<indicatif::ProgressBar>,
}

impl ConsolePrompt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide the bar while waiting for input so it does not draw over the question
    pub fn with_progress_bar(mut self, progress_bar: indicatif::ProgressBar) -> Self {
        self.progress_bar = Some(progress_bar);
        self
    }

    fn read_line(message: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", message)?;
        stdout.flush()?;

        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl OperatorPrompt for ConsolePrompt {
    fn ask(&mut self, message: &str) -> io::Result<Option<String>> {
        match &self.progress_bar {
            Some(pb) => pb.suspend(|| Self::read_line(message)),
            None => Self::read_line(message),
        }
    }
}

/// Plays back canned answers; records every question asked
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    questions: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            questions: Vec::new(),
        }
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl OperatorPrompt for ScriptedPrompt {
    fn ask(&mut self, message: &str) -> io::Result<Option<String>> {
        self.questions.push(message.to_string());
        Ok(self.answers.pop_front())
    }
}

/// States of the recovery dialogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    AwaitingChoice,
    AwaitingCredential,
    AwaitingModel,
    Retrying,
    Aborted,
}

pub const CHOICE_MENU: &str = "[1] Enter a new API key  [2] Choose another model  [3] Quit\nChoice: ";

/// Drives one recovery dialogue to `Retrying` or `Aborted`
pub struct RecoveryShell<'a> {
    prompt: &'a mut dyn OperatorPrompt,
    state: RecoveryState,
}

impl<'a> RecoveryShell<'a> {
    pub fn new(prompt: &'a mut dyn OperatorPrompt) -> Self {
        Self {
            prompt,
            state: RecoveryState::AwaitingChoice,
        }
    }

    pub fn state(&self) -> RecoveryState {
        self.state
    }

    /// Run the dialogue for `failure`, updating `run` in place
    ///
    /// Returns `Ok(())` once the credential or model was changed and the
    /// request should be sent again, `Err(Aborted)` when the operator quits.
    pub fn recover(
        &mut self,
        failure: &ProviderError,
        run: &mut RunState,
    ) -> Result<(), TranslationError> {
        error!("{}", failure);
        error!("Current model: {}", run.model());
        self.state = RecoveryState::AwaitingChoice;

        loop {
            self.state = match self.state {
                RecoveryState::AwaitingChoice => self.on_choice()?,
                RecoveryState::AwaitingCredential => self.on_credential(run)?,
                RecoveryState::AwaitingModel => self.on_model(run)?,
                RecoveryState::Retrying => return Ok(()),
                RecoveryState::Aborted => return Err(TranslationError::Aborted),
            };
        }
    }

    fn read(&mut self, message: &str) -> Result<Option<String>, TranslationError> {
        self.prompt
            .ask(message)
            .map(|answer| answer.map(|a| a.trim().to_string()))
            .map_err(|e| TranslationError::Prompt(e.to_string()))
    }

    fn on_choice(&mut self) -> Result<RecoveryState, TranslationError> {
        let Some(answer) = self.read(CHOICE_MENU)? else {
            warn!("Input closed, aborting");
            return Ok(RecoveryState::Aborted);
        };

        Ok(match answer.as_str() {
            "1" => RecoveryState::AwaitingCredential,
            "2" => RecoveryState::AwaitingModel,
            "3" | "q" | "quit" => RecoveryState::Aborted,
            other => {
                error!("Invalid choice '{}', expected 1, 2 or 3", other);
                RecoveryState::AwaitingChoice
            }
        })
    }

    fn on_credential(&mut self, run: &mut RunState) -> Result<RecoveryState, TranslationError> {
        let Some(answer) = self.read("New API key: ")? else {
            warn!("Input closed, aborting");
            return Ok(RecoveryState::Aborted);
        };

        if answer == run.api_key() {
            error!("That key was just rejected, enter a different one");
            return Ok(RecoveryState::AwaitingCredential);
        }

        match run.set_api_key(&answer) {
            Ok(()) => {
                info!("API key updated");
                Ok(RecoveryState::Retrying)
            }
            Err(e) => {
                error!("{}", e);
                Ok(RecoveryState::AwaitingCredential)
            }
        }
    }

    fn on_model(&mut self, run: &mut RunState) -> Result<RecoveryState, TranslationError> {
        let mut menu = String::from("Available models:\n");
        for (idx, model) in run.available_models().iter().enumerate() {
            let marker = if model == run.model() { " (current)" } else { "" };
            menu.push_str(&format!("  [{}] {}{}\n", idx, model, marker));
        }
        menu.push_str("Model number: ");

        let Some(answer) = self.read(&menu)? else {
            warn!("Input closed, aborting");
            return Ok(RecoveryState::Aborted);
        };

        let current = run.model().to_string();
        let selected = answer
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("'{}' is not a model number", answer))
            .and_then(|index| {
                if run.available_models().get(index) == Some(&current) {
                    Err(anyhow::anyhow!("{} is the model that just failed", current))
                } else {
                    run.select_model(index).map(str::to_string)
                }
            });

        match selected {
            Ok(model) => {
                info!("Switched to model {}", model);
                Ok(RecoveryState::Retrying)
            }
            Err(e) => {
                error!("{}", e);
                Ok(RecoveryState::AwaitingModel)
            }
        }
    }
}
