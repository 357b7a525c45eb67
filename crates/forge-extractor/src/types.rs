//! Result types for extraction

use forge_domain::{Entity, Relationship};
use std::collections::BTreeMap;

/// Optional field-name → description hints appended to extraction prompts
pub type SchemaHints = BTreeMap<String, String>;

/// Everything extracted from a single chunk
///
/// A chunk whose LLM output could not be parsed yields an empty result with
/// the problem recorded in `errors` - a soft failure, never a crash.
#[derive(Debug, Clone, Default)]
pub struct ChunkExtraction {
    /// Index of the originating chunk
    pub chunk_index: usize,

    /// Candidate entities, provenance-tagged with the chunk index
    pub entities: Vec<Entity>,

    /// Candidate relationships between this chunk's entities
    pub relationships: Vec<Relationship>,

    /// Soft-failure notes: malformed records, unresolved endpoints
    pub errors: Vec<String>,
}

impl ChunkExtraction {
    /// An empty result carrying a single error note
    pub fn failed(chunk_index: usize, note: impl Into<String>) -> Self {
        Self {
            chunk_index,
            entities: Vec::new(),
            relationships: Vec::new(),
            errors: vec![note.into()],
        }
    }
}
