/*!
 * Mock provider for testing.
 *
 * Replies are taken from a script in order. Once the script is used up the
 * provider echoes the prompt back as a numbered list, tagging each line so
 * tests can tell translated text from source text.
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::Provider;
use crate::errors::ProviderError;

static NUMBERED_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)\.\s(.*)$").expect("numbered line regex is valid"));

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Generated text returned verbatim
    Text(String),
    /// An error object from the endpoint
    ApiError(String),
    /// The request never completed
    Transport(String),
}

/// A call observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub model: String,
    pub api_key: String,
    pub prompt: String,
}

/// Scripted provider
#[derive(Debug, Clone)]
pub struct MockProvider {
    script: Arc<Mutex<VecDeque<MockReply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    echo_tag: String,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::echo()
    }
}

impl MockProvider {
    /// A provider that only echoes
    pub fn echo() -> Self {
        Self::scripted(Vec::new())
    }

    /// A provider that plays `replies` first, then echoes
    pub fn scripted(replies: Vec<MockReply>) -> Self {
        Self {
            script: Arc::new(Mutex::new(replies.into())),
            calls: Arc::new(Mutex::new(Vec::new())),
            echo_tag: "[tr]".to_string(),
        }
    }

    /// Change the tag put in front of echoed lines
    pub fn with_echo_tag(mut self, tag: impl Into<String>) -> Self {
        self.echo_tag = tag.into();
        self
    }

    /// Queue another reply
    pub fn push(&self, reply: MockReply) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
    }

    /// Calls seen so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Build the reply the echo mode would give for a prompt
    pub fn echo_reply(&self, prompt: &str) -> String {
        prompt
            .lines()
            .filter_map(|line| NUMBERED_LINE_RE.captures(line))
            .map(|caps| format!("{}. {} {}", &caps[1], self.echo_tag, &caps[2]))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        model: &str,
        api_key: &str,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                model: model.to_string(),
                api_key: api_key.to_string(),
                prompt: prompt.to_string(),
            });
        }

        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::ApiError(message)) => Err(ProviderError::ApiError {
                status_code: 400,
                message,
            }),
            Some(MockReply::Transport(message)) => Err(ProviderError::RequestFailed(message)),
            None => Ok(self.echo_reply(prompt)),
        }
    }
}
