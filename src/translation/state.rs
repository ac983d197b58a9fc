use anyhow::{Result, anyhow};

use super::progress::ProgressTracker;
use crate::app_config::TranslationConfig;

/// Mutable state of one run
///
/// Holds the model and credential currently in use. The recovery shell
/// replaces them in place, and the next attempt picks them up.
#[derive(Debug, Clone)]
pub struct RunState {
    model: String,
    api_key: String,
    available_models: Vec<String>,
    pub progress: ProgressTracker,
}

impl RunState {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, available_models: Vec<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            available_models,
            progress: ProgressTracker::default(),
        }
    }

    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(
            config.model.clone(),
            config.api_key.clone(),
            config.available_models.clone(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn available_models(&self) -> &[String] {
        &self.available_models
    }

    /// Switch to the model at `index` in the allow-list
    pub fn select_model(&mut self, index: usize) -> Result<&str> {
        let model = self
            .available_models
            .get(index)
            .ok_or_else(|| {
                anyhow!(
                    "Model index {} is out of range (0..{})",
                    index,
                    self.available_models.len()
                )
            })?
            .clone();
        self.model = model;
        Ok(&self.model)
    }

    /// Replace the credential; blank input is rejected
    pub fn set_api_key(&mut self, api_key: &str) -> Result<()> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(anyhow!("API key must not be empty"));
        }
        self.api_key = api_key.to_string();
        Ok(())
    }
}
