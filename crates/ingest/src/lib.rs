pub mod document;

pub use document::chunker;
pub use document::{
    extract_documents, load_knowledge_base, DocumentMeta, ExtractionError, SourceDocument,
};
