//! Forge LLM Provider Layer
//!
//! Pluggable LLM client implementations behind one async capability trait.
//!
//! # Architecture
//!
//! The extraction core only ever talks to [`LlmClient`]. Failures are typed
//! so the pipeline can apply different policies per failure class: backoff
//! on rate limits, immediate run failure on authentication errors, per-chunk
//! skip on everything else. Clients perform no retries of their own.
//!
//! # Clients
//!
//! - [`MockClient`]: deterministic scripted client for testing
//! - [`OllamaClient`]: local Ollama API integration
//!
//! # Examples
//!
//! ```
//! use forge_llm::{CompletionRequest, LlmClient, MockClient};
//!
//! # tokio_test::block_on(async {
//! let client = MockClient::new("Hello from the model");
//! let request = CompletionRequest::new("test prompt");
//! let result = client.complete(&request).await.unwrap();
//! assert_eq!(result, "Hello from the model");
//! # });
//! ```

#![warn(missing_docs)]

pub mod ollama;

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaClient;

/// Errors that can occur during LLM operations
///
/// The taxonomy matters: the pipeline keys its retry policy off these
/// variants rather than inspecting messages.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Credentials rejected by the provider; retrying cannot help
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Provider rate limit hit; safe to retry after a delay
    #[error("Rate limit exceeded")]
    RateLimited {
        /// Provider-suggested wait, when one was supplied
        retry_after: Option<Duration>,
    },

    /// The request did not complete within the client timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered but the payload could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Requested model is not available on the provider
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),
}

impl LlmError {
    /// Whether this failure ends the whole run rather than one chunk
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// Whether retrying the same call may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Communication(_)
        )
    }
}

/// A single completion request
///
/// Carries everything a provider needs for one call; the pipeline treats it
/// as immutable once built.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// User prompt text
    pub prompt: String,

    /// System prompt text
    pub system_prompt: String,

    /// Provider-specific model identifier
    pub model_id: String,

    /// Sampling temperature
    pub temperature: f64,

    /// Optional completion length cap
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a request with default model settings
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: String::new(),
            model_id: String::new(),
            temperature: 0.2,
            max_tokens: None,
        }
    }

    /// Set the system prompt, builder-style
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = system_prompt.into();
        self
    }

    /// Set the model id, builder-style
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Set the temperature, builder-style
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the completion length, builder-style
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Async capability trait for LLM completion
///
/// Implementations must be cheap to share (`Arc`) across concurrent
/// extraction tasks.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for the given request
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// Failure classes a [`MockClient`] rule can inject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Inject [`LlmError::Authentication`]
    Authentication,

    /// Inject [`LlmError::RateLimited`]
    RateLimited,

    /// Inject [`LlmError::Timeout`]
    Timeout,

    /// Inject [`LlmError::Communication`]
    Communication,
}

impl MockFailure {
    fn to_error(self) -> LlmError {
        match self {
            Self::Authentication => LlmError::Authentication("mock credentials rejected".to_string()),
            Self::RateLimited => LlmError::RateLimited { retry_after: None },
            Self::Timeout => LlmError::Timeout(Duration::from_secs(1)),
            Self::Communication => LlmError::Communication("mock connection refused".to_string()),
        }
    }
}

enum MockOutcome {
    Respond(String),
    Fail(MockFailure),
}

struct MockRule {
    needle: String,
    outcome: MockOutcome,
}

/// Deterministic mock LLM client for testing
///
/// Returns pre-configured responses without making any network calls.
/// Rules match on a substring of the prompt, which keeps tests independent
/// of prompt assembly details and of concurrent call ordering; the first
/// matching rule wins and the default response covers the rest.
///
/// # Examples
///
/// ```
/// use forge_llm::{CompletionRequest, LlmClient, MockClient, MockFailure};
///
/// # tokio_test::block_on(async {
/// let client = MockClient::new("default");
/// client.add_response("alpha", "saw alpha");
/// client.add_failure("beta", MockFailure::RateLimited);
///
/// let ok = client.complete(&CompletionRequest::new("text with alpha inside")).await;
/// assert_eq!(ok.unwrap(), "saw alpha");
///
/// let err = client.complete(&CompletionRequest::new("text with beta inside")).await;
/// assert!(err.is_err());
/// # });
/// ```
#[derive(Clone)]
pub struct MockClient {
    default_response: String,
    rules: Arc<Mutex<Vec<MockRule>>>,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockClient {
    /// Create a MockClient with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Respond with `response` whenever the prompt contains `needle`
    pub fn add_response(&self, needle: impl Into<String>, response: impl Into<String>) {
        self.rules.lock().unwrap().push(MockRule {
            needle: needle.into(),
            outcome: MockOutcome::Respond(response.into()),
        });
    }

    /// Fail with the given class whenever the prompt contains `needle`
    pub fn add_failure(&self, needle: impl Into<String>, failure: MockFailure) {
        self.rules.lock().unwrap().push(MockRule {
            needle: needle.into(),
            outcome: MockOutcome::Fail(failure),
        });
    }

    /// Number of completion calls made so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Requests seen so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new("[]")
    }
}

#[async_trait]
impl LlmClient for MockClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(request.clone());

        let rules = self.rules.lock().unwrap();
        for rule in rules.iter() {
            if request.prompt.contains(&rule.needle) {
                return match &rule.outcome {
                    MockOutcome::Respond(response) => Ok(response.clone()),
                    MockOutcome::Fail(failure) => Err(failure.to_error()),
                };
            }
        }

        Ok(self.default_response.clone())
    }
}
