use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Provider;
use crate::errors::ProviderError;

/// Header carrying the API credential
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for the `generateContent` endpoint
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// Base URL; the model name and `:generateContent` are appended
    endpoint: String,
}

/// generateContent request body
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiRequest {
    pub contents: Vec<GeminiContent>,
}

/// One content block with its parts
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// A text part
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

/// generateContent response body; either `error` or `candidates` is set
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    #[serde(default)]
    pub error: Option<GeminiError>,
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct GeminiError {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    #[serde(default)]
    pub content: Option<GeminiContent>,
}

impl GeminiRequest {
    /// Build a single-turn request around one prompt
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt.into() }],
            }],
        }
    }
}

impl Gemini {
    /// Create a new client
    ///
    /// Without a timeout the request blocks until the transport gives up.
    /// Fails when the HTTP client cannot be set up (e.g. no TLS backend).
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ProviderError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Full URL for a model
    pub fn api_url(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.endpoint.trim_end_matches('/'), model)
    }

    /// Interpret a response body
    ///
    /// An error object wins over everything else. Without one, the text of
    /// the first candidate is returned as-is.
    pub fn interpret_body(status_code: u16, body: &str) -> Result<String, ProviderError> {
        let response: GeminiResponse = match serde_json::from_str(body) {
            Ok(response) => response,
            Err(e) if (200..300).contains(&status_code) => {
                return Err(ProviderError::ParseError(e.to_string()));
            }
            Err(_) => {
                return Err(ProviderError::RequestFailed(format!(
                    "HTTP {} with unreadable body",
                    status_code
                )));
            }
        };

        if let Some(err) = response.error {
            return Err(ProviderError::ApiError {
                status_code: err.code.unwrap_or(status_code),
                message: err.message,
            });
        }

        Self::extract_text(&response)
            .ok_or_else(|| ProviderError::ParseError("response has no candidate text".to_string()))
    }

    /// Extract the concatenated text parts of the first candidate
    pub fn extract_text(response: &GeminiResponse) -> Option<String> {
        let content = response.candidates.first()?.content.as_ref()?;
        Some(content.parts.iter().map(|p| p.text.as_str()).collect())
    }
}

#[async_trait]
impl Provider for Gemini {
    async fn complete(
        &self,
        model: &str,
        api_key: &str,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let api_url = self.api_url(model);
        debug!("POST {} ({} prompt chars)", api_url, prompt.chars().count());

        let response = self
            .client
            .post(&api_url)
            .header("Content-Type", "application/json")
            .header(API_KEY_HEADER, api_key)
            .json(&GeminiRequest::new(prompt))
            .send()
            .await
            .map_err(|e| {
                error!("Request to {} failed: {}", api_url, e);
                ProviderError::RequestFailed(e.to_string())
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read response body: {}", e)))?;

        Self::interpret_body(status, &body)
    }
}
