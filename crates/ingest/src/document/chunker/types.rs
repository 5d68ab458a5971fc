//! Chunker intermediate and output types.

use crate::document::DocumentMeta;

/// Two-state machine for tracking fenced code regions during a line scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FenceState {
    Outside,
    Inside,
}

impl FenceState {
    pub(crate) fn toggle(self) -> Self {
        match self {
            FenceState::Outside => FenceState::Inside,
            FenceState::Inside => FenceState::Outside,
        }
    }
}

/// A contiguous span of lines under one heading (or the untitled preamble).
/// The heading line itself belongs to the section body.
#[derive(Debug, Clone)]
pub struct Section {
    /// Heading text with ATX markers stripped; `None` for the preamble.
    pub title: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Text,
    Code,
}

/// The smallest unit the chunker will not split: a paragraph or one
/// complete fenced code excerpt.
#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

/// A chunk from the document-collection variant, with attribution metadata.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    /// 0-based index within the source document, strictly increasing.
    pub index: usize,
    pub text: String,
    /// Owning section title, when the section had a non-empty one.
    pub section_title: Option<String>,
    /// Caller-supplied document metadata, passed through unchanged.
    pub meta: DocumentMeta,
}
