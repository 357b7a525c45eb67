//! Forge Pipeline
//!
//! The orchestrator: sequences chunking, concurrent extraction,
//! reconciliation, validation, human review checkpoints, and the final
//! commit, with failure and retry policy applied end to end.
//!
//! # Run lifecycle
//!
//! ```text
//! Pending → Chunking → Extracting → Reconciling → Validating
//!         → AwaitingReview → Committing → Completed | Aborted | Failed
//! ```
//!
//! # Failure policy
//!
//! - A chunk whose extraction fails contributes zero candidates; its error
//!   is recorded and the run continues - unless every chunk fails, which
//!   fails the run
//! - Rate-limited and timed-out calls retry with exponential backoff up to
//!   a configured cap; authentication failures fail the run immediately and
//!   stop new chunk calls from being issued (in-flight calls finish and are
//!   discarded)
//! - ABORT at any review checkpoint is terminal; RETRY re-runs
//!   reconciliation and validation only, never extraction
//!
//! The run summary always carries per-phase notes, even on success, so a
//! reviewer sees "2 of 3 chunks succeeded" rather than a bare pass/fail.

#![warn(missing_docs)]

mod config;
mod error;
mod orchestrator;
mod summary;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use orchestrator::Orchestrator;
pub use summary::{RunState, RunSummary};
