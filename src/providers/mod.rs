/*!
 * Provider implementations for the remote text-generation endpoint.
 *
 * - `gemini`: `generateContent` REST client
 * - `mock`: scripted provider for tests and dry runs
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for generation backends
///
/// The model and credential are passed on every call because the operator
/// may replace either of them between two attempts.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Send one prompt and return the generated text
    ///
    /// # Returns
    /// * `Ok(text)` - the endpoint answered without an error object
    /// * `Err(ProviderError::ApiError)` - the endpoint answered with an error object
    /// * `Err(ProviderError::RequestFailed | ParseError)` - the call did not complete usefully
    async fn complete(&self, model: &str, api_key: &str, prompt: &str)
    -> Result<String, ProviderError>;
}

pub mod gemini;
pub mod mock;
