//! Error types for the pipeline

use forge_extractor::ExtractorError;
use forge_sentinel::SentinelError;
use thiserror::Error;

/// Setup errors that prevent a run from starting
///
/// Failures *during* a run (chunk failures, aborts, store errors) are not
/// errors here: they land in the run summary with an appropriate status, so
/// the caller always gets the per-phase picture.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration rejected before the run started
    #[error("Configuration error: {0}")]
    Config(String),

    /// Chunker or prompt setup failed
    #[error(transparent)]
    Extractor(#[from] ExtractorError),

    /// Sentinel setup failed
    #[error(transparent)]
    Sentinel(#[from] SentinelError),
}
