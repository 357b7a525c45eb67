//! Run states and the end-of-run summary

use std::fmt;

/// Lifecycle states of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Constructed, not yet started
    Pending,

    /// Splitting source text into chunks
    Chunking,

    /// Per-chunk LLM extraction in flight
    Extracting,

    /// Deduplicating candidates
    Reconciling,

    /// Structural validation
    Validating,

    /// Paused at a human review checkpoint
    AwaitingReview,

    /// Handing accepted output to the store
    Committing,

    /// Terminal: run finished (possibly with per-chunk failures)
    Completed,

    /// Terminal: a reviewer aborted the run
    Aborted,

    /// Terminal: the run itself failed
    Failed,
}

impl RunState {
    /// Whether this state ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Aborted | Self::Failed)
    }

    /// The canonical surface form of this state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Chunking => "chunking",
            Self::Extracting => "extracting",
            Self::Reconciling => "reconciling",
            Self::Validating => "validating",
            Self::AwaitingReview => "awaiting_review",
            Self::Committing => "committing",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What one run did, success or not
///
/// Always populated with per-phase notes: a reviewer should see
/// "2 of 3 chunks succeeded", not a bare pass/fail.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Terminal state of the run
    pub status: RunState,

    /// Entities committed to the store
    pub entity_count: usize,

    /// Relationships committed to the store
    pub relationship_count: usize,

    /// Chunks produced from the source
    pub chunks_total: usize,

    /// Chunks whose extraction succeeded
    pub chunks_succeeded: usize,

    /// Chunks whose extraction failed
    pub chunks_failed: usize,

    /// Error-level notes, per phase
    pub phase_errors: Vec<String>,

    /// Warning- and info-level notes, per phase
    pub warnings: Vec<String>,
}

impl RunSummary {
    pub(crate) fn new() -> Self {
        Self {
            status: RunState::Pending,
            entity_count: 0,
            relationship_count: 0,
            chunks_total: 0,
            chunks_succeeded: 0,
            chunks_failed: 0,
            phase_errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// One-line human-readable digest
    pub fn digest(&self) -> String {
        format!(
            "{}: {} entities, {} relationships ({}/{} chunks succeeded, {} errors, {} warnings)",
            self.status,
            self.entity_count,
            self.relationship_count,
            self.chunks_succeeded,
            self.chunks_total,
            self.phase_errors.len(),
            self.warnings.len()
        )
    }
}
