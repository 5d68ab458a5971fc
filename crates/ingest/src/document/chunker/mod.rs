//! Heading- and code-block-aware chunking engine.
//!
//! Splits documents into retrieval-sized windows in three passes: a
//! heading scan producing [`Section`]s, a block scan producing paragraph
//! and fenced-code [`Block`]s, and greedy windowing with a text-only
//! overlap carried between adjacent chunks. Code blocks are never split;
//! chunk boundaries never fall inside an open fence.

mod split;
mod types;
mod windows;

use crate::document::SourceDocument;

pub use types::{Block, BlockKind, ChunkRecord, Section};

use split::{split_blocks, split_sections};
use windows::window_blocks;

#[cfg(test)]
mod tests;

/// Split raw text into ordered chunk strings.
///
/// `max_chars` bounds each chunk's length (a single oversized block is
/// still emitted whole); `overlap_chars` bounds the trailing text-block
/// overlap carried into the next chunk. An empty document yields no chunks.
pub fn chunk_text(text: &str, max_chars: usize, overlap_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    for section in split_sections(text) {
        let blocks = split_blocks(&section.text);
        chunks.extend(window_blocks(&blocks, max_chars, overlap_chars));
    }
    chunks
}

/// Split a document collection into metadata-bearing chunks.
///
/// Each chunk carries a per-document monotonically increasing index and
/// the owning section's title (when the section has one); the document's
/// own metadata passes through unchanged.
pub fn chunk_documents(
    documents: &[SourceDocument],
    max_chars: usize,
    overlap_chars: usize,
) -> Vec<ChunkRecord> {
    let mut records = Vec::new();
    for doc in documents {
        let mut chunk_index = 0usize;
        for section in split_sections(&doc.text) {
            let blocks = split_blocks(&section.text);
            for text in window_blocks(&blocks, max_chars, overlap_chars) {
                records.push(ChunkRecord {
                    index: chunk_index,
                    text,
                    section_title: section.title.clone().filter(|t| !t.is_empty()),
                    meta: doc.meta.clone(),
                });
                chunk_index += 1;
            }
        }
    }
    records
}
