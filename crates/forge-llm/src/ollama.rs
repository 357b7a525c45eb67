//! Ollama client implementation
//!
//! Integration with Ollama's local generate API. Supports running local
//! models so extraction works without cloud credentials.
//!
//! # Features
//!
//! - Async HTTP communication with the Ollama API
//! - Configurable endpoint and default model
//! - Status codes mapped onto the [`LlmError`] taxonomy
//! - Request timeout handling
//!
//! The client deliberately performs no retries: backoff policy belongs to
//! the pipeline, which knows whether a failure sinks one chunk or the run.

use crate::{CompletionRequest, LlmClient, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default timeout for LLM requests
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Ollama API client for local LLM inference
pub struct OllamaClient {
    endpoint: String,
    default_model: String,
    timeout: Duration,
    client: reqwest::Client,
}

/// Request body for the Ollama generate API
#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response from the Ollama generate API
#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
    #[allow(dead_code)]
    done: bool,
}

impl OllamaClient {
    /// Create a new Ollama client
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `default_model`: model used when a request names none
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use forge_llm::OllamaClient;
    ///
    /// let client = OllamaClient::new("http://localhost:11434", "llama3");
    /// ```
    pub fn new(endpoint: impl Into<String>, default_model: impl Into<String>) -> Self {
        let timeout = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client construction cannot fail with static options");

        Self {
            endpoint: endpoint.into(),
            default_model: default_model.into(),
            timeout,
            client,
        }
    }

    /// Create a client against the default local endpoint
    pub fn default_endpoint(default_model: impl Into<String>) -> Self {
        Self::new(DEFAULT_ENDPOINT, default_model)
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client construction cannot fail with static options");
        self
    }

    fn retry_after(response: &reqwest::Response) -> Option<Duration> {
        response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);

        let model = if request.model_id.is_empty() {
            self.default_model.clone()
        } else {
            request.model_id.clone()
        };

        let body = GenerateRequest {
            model: model.clone(),
            prompt: request.prompt.clone(),
            system: request.system_prompt.clone(),
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.timeout)
            } else {
                LlmError::Communication(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if status.is_success() {
            let parsed: GenerateResponse = response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
            return Ok(parsed.response);
        }

        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(LlmError::Authentication(format!("HTTP {}", status)))
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => Err(LlmError::RateLimited {
                retry_after: Self::retry_after(&response),
            }),
            reqwest::StatusCode::NOT_FOUND => Err(LlmError::ModelNotAvailable(model)),
            _ => {
                let text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(LlmError::Communication(format!("HTTP {}: {}", status, text)))
            }
        }
    }
}
