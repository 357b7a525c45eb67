//! Forge Sentinel
//!
//! Reconciles candidate entities extracted from overlapping chunks into a
//! deduplicated canonical set.
//!
//! # Overview
//!
//! Chunks overlap, so the same entity routinely arrives several times under
//! slightly different surface forms. The Sentinel scores candidate pairs
//! with a pluggable [`SimilarityScorer`] and sorts each pair into one of
//! three bands:
//!
//! - at or above the auto-merge threshold: merged automatically
//! - in the review band: deferred to the human review queue
//! - below the review band: kept as distinct entities
//!
//! Entities of conflicting specific kinds are never merged silently, no
//! matter how similar - they are always deferred to review.
//!
//! # Determinism
//!
//! Given the same candidate set and configuration, `reconcile` produces the
//! same merged set and the same review queue. Candidates are processed in
//! (chunk index, arrival order) order, which makes the pass insensitive to
//! the completion order of concurrent extraction calls - a requirement for
//! the review protocol to be replayable.

#![warn(missing_docs)]

mod config;
mod reconciler;
mod similarity;

pub use config::SentinelConfig;
pub use reconciler::{
    MergeAction, MergeCandidate, MergeDecision, ReconcileOutcome, Sentinel, SentinelStats,
};
pub use similarity::{NameOverlapScorer, SimilarityScorer};

use thiserror::Error;

/// Errors that can occur constructing a Sentinel
#[derive(Error, Debug)]
pub enum SentinelError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
