//! Source text chunking with overlap
//!
//! Chunks are sized for one LLM call each. Consecutive chunks overlap so an
//! entity mentioned near a boundary appears in two chunks, which lets the
//! reconciliation pass stitch it back together.

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};

/// A bounded, ordered slice of source text sized for one LLM call
///
/// Created once per run by the [`Chunker`]; immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position in document order
    pub index: usize,

    /// The slice of source text
    pub text: String,

    /// Byte offsets (start, end) into the source
    pub span: (usize, usize),
}

/// Configuration for the chunker
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk size in bytes
    pub max_chunk_chars: usize,

    /// Overlap between consecutive chunks in bytes
    pub overlap_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: 4_000,
            overlap_chars: 200,
        }
    }
}

impl ChunkerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_chars == 0 {
            return Err("max_chunk_chars must be greater than 0".to_string());
        }
        if self.overlap_chars >= self.max_chunk_chars {
            return Err(format!(
                "overlap_chars {} must be less than max_chunk_chars {}",
                self.overlap_chars, self.max_chunk_chars
            ));
        }
        Ok(())
    }
}

/// Splits source text into overlapping windows
///
/// Windows advance by `max_chunk_chars - overlap_chars`. A window end snaps
/// back to the nearest paragraph or sentence boundary when one exists in the
/// tail of the window; otherwise it is a hard cut on a UTF-8 boundary.
///
/// Guarantees:
/// - chunks come out in document order with 0-based indices
/// - the spans, with overlaps removed, reconstruct the source range exactly
/// - output is a pure function of the input: no randomness, no side effects
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a chunker, rejecting invalid configuration
    pub fn new(config: ChunkerConfig) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self { config })
    }

    /// Split the source into chunks
    ///
    /// Empty input yields an empty sequence, not an error.
    pub fn chunk(&self, source: &str) -> Vec<Chunk> {
        let len = source.len();
        let mut chunks = Vec::new();
        if len == 0 {
            return chunks;
        }

        let max = self.config.max_chunk_chars;
        let overlap = self.config.overlap_chars;

        let mut start = 0usize;
        let mut index = 0usize;

        loop {
            let end = if start + max >= len {
                len
            } else {
                self.cut_point(source, start, start + max)
            };

            chunks.push(Chunk {
                index,
                text: source[start..end].to_string(),
                span: (start, end),
            });
            index += 1;

            if end >= len {
                break;
            }

            // Next window starts `overlap` bytes back, aligned forward to a
            // char boundary; always strictly after the previous start.
            let mut next = end.saturating_sub(overlap).max(start + 1);
            while next < len && !source.is_char_boundary(next) {
                next += 1;
            }
            start = next;
        }

        chunks
    }

    /// Pick the end of a window, snapping back to a boundary when possible
    ///
    /// The search floor keeps snapped ends inside the tail third of the
    /// window and past the overlap region, so every window still makes
    /// progress.
    fn cut_point(&self, source: &str, start: usize, hard_end: usize) -> usize {
        let floor = (hard_end - self.config.max_chunk_chars / 3)
            .max(start + self.config.overlap_chars + 1)
            .min(hard_end);

        let tail = &source[floor..hard_end];

        // Paragraph break first, then sentence enders, then a line break.
        for boundary in ["\n\n", ". ", "! ", "? ", "\n"] {
            if let Some(pos) = tail.rfind(boundary) {
                return floor + pos + boundary.len();
            }
        }

        // Hard cut: back off to a char boundary.
        let mut end = hard_end;
        while end > floor && !source.is_char_boundary(end) {
            end -= 1;
        }
        if end <= start {
            end = hard_end;
            while end < source.len() && !source.is_char_boundary(end) {
                end += 1;
            }
        }
        end
    }
}
