//! Error types for the Extractor

use forge_llm::LlmError;
use thiserror::Error;

/// Errors that can occur during extraction
///
/// Malformed LLM *output* is not represented here: it is a soft failure
/// recorded on the [`ChunkExtraction`](crate::ChunkExtraction) instead.
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// The LLM call itself failed (transport, auth, rate limit)
    #[error("LLM call failed for chunk {chunk_index}: {source}")]
    LlmCall {
        /// Index of the chunk whose call failed
        chunk_index: usize,
        /// The underlying client failure
        #[source]
        source: LlmError,
    },

    /// The LLM call did not complete within the configured timeout
    #[error("Extraction timed out for chunk {chunk_index}")]
    Timeout {
        /// Index of the chunk whose call timed out
        chunk_index: usize,
    },

    /// Prompt template missing or malformed
    #[error("Prompt template error: {0}")]
    Prompt(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Whether this failure should end the whole run
    ///
    /// Only authentication failures are fatal: every other chunk-level
    /// failure skips the chunk and lets the run continue.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::LlmCall {
                source: LlmError::Authentication(_),
                ..
            }
        )
    }
}
