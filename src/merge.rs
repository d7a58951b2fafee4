//! Merging of per-chunk summarization results.
//!
//! Each chunk's output is treated as an independent, trustworthy unit
//! appended in document order: chunk order first, then intra-chunk order.
//! No de-duplication or cross-chunk editing happens here; that would need
//! another model call. Globally sequential identifiers are assigned by the
//! summary composer after the merge, so identifiers can never collide
//! across chunks.

use crate::models::RawSection;

/// Sections produced for one chunk, tagged with the chunk's document-order
/// index so out-of-order completion cannot scramble the merge.
#[derive(Debug, Clone)]
pub struct ChunkSummary {
    pub chunk_index: usize,
    pub sections: Vec<RawSection>,
}

/// Combine per-chunk section lists into one ordered list.
pub fn merge_chunks(mut results: Vec<ChunkSummary>) -> Vec<RawSection> {
    results.sort_by_key(|r| r.chunk_index);
    results.into_iter().flat_map(|r| r.sections).collect()
}
