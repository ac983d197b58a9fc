/*!
 * Translation client.
 *
 * Sends one prompt to the provider and keeps at it until there is a reply.
 * An error object from the endpoint hands control to the operator; a call
 * that did not complete is reported back as transient so the caller can
 * retry the whole batch later.
 */

use log::{debug, info, warn};
use std::sync::Arc;

use super::recovery::{OperatorPrompt, RecoveryShell};
use super::state::RunState;
use crate::errors::TranslationError;
use crate::providers::Provider;

pub struct TranslationClient {
    provider: Arc<dyn Provider>,
    prompt: Box<dyn OperatorPrompt>,
}

impl TranslationClient {
    pub fn new(provider: Arc<dyn Provider>, prompt: Box<dyn OperatorPrompt>) -> Self {
        Self { provider, prompt }
    }

    /// Send `prompt_text` with the model and credential currently in `run`
    ///
    /// # Returns
    /// * `Ok(text)` - raw reply text, not validated here
    /// * `Err(Transient)` - the call did not complete; retry the batch later
    /// * `Err(Aborted)` - the operator quit; stop the whole run
    pub async fn send(
        &mut self,
        run: &mut RunState,
        prompt_text: &str,
    ) -> Result<String, TranslationError> {
        let mut attempt = 1;

        loop {
            debug!("Sending prompt (attempt {}, model {})", attempt, run.model());

            match self
                .provider
                .complete(run.model(), run.api_key(), prompt_text)
                .await
            {
                Ok(text) => return Ok(text),
                Err(e) if e.needs_operator() => {
                    RecoveryShell::new(self.prompt.as_mut()).recover(&e, run)?;
                    info!("Resending the same batch with model {}", run.model());
                    attempt += 1;
                }
                Err(e) => {
                    warn!("{}", e);
                    return Err(TranslationError::Transient(e));
                }
            }
        }
    }
}
