//! Document loading and extraction.
//!
//! Turns knowledge-base files (.md, .txt, .pdf) into plain-text
//! [`SourceDocument`]s ready for chunking. PDF extraction is a thin
//! pass-through to `pdf-extract`.

pub mod chunker;
mod pdf;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("PDF extraction failed: {0}")]
    PdfError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Structured document metadata carried through chunking and retrieval.
///
/// Named optional fields — an absent value stays absent instead of being
/// miscoded as an empty string or zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub file_name: Option<String>,
    pub file_path: Option<String>,
    /// 1-based page number (PDFs only).
    pub page: Option<usize>,
}

/// A plain-text document plus its metadata. PDFs yield one per page.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub text: String,
    pub meta: DocumentMeta,
}

/// Extract plain-text documents from file bytes based on the file extension.
pub fn extract_documents(
    bytes: &[u8],
    filename: &str,
) -> Result<Vec<SourceDocument>, ExtractionError> {
    let ext = filename.rsplit('.').next().unwrap_or("").to_lowercase();

    let base_meta = DocumentMeta {
        file_name: Some(filename.to_string()),
        file_path: None,
        page: None,
    };

    match ext.as_str() {
        "md" | "markdown" | "txt" | "text" => {
            let text = String::from_utf8(bytes.to_vec())
                .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned());
            Ok(vec![SourceDocument {
                text: text.trim().to_string(),
                meta: base_meta,
            }])
        }
        "pdf" => {
            let pages = pdf::extract_pdf(bytes)?;
            Ok(pages
                .into_iter()
                .map(|(page_number, text)| SourceDocument {
                    text,
                    meta: DocumentMeta {
                        page: Some(page_number),
                        ..base_meta.clone()
                    },
                })
                .collect())
        }
        other => Err(ExtractionError::UnsupportedType(other.to_string())),
    }
}

/// Walk a knowledge-base directory and extract every supported document.
///
/// Unreadable or unparsable files are logged and skipped so one bad file
/// never blocks an index build.
pub fn load_knowledge_base(dir: &Path) -> Result<Vec<SourceDocument>, ExtractionError> {
    let mut documents = Vec::new();
    let mut skipped = 0usize;

    for entry in walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        if !matches!(ext.as_str(), "md" | "markdown" | "txt" | "text" | "pdf") {
            continue;
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                skipped += 1;
                continue;
            }
        };

        match extract_documents(&bytes, &filename) {
            Ok(docs) => {
                for mut doc in docs {
                    if doc.text.trim().is_empty() {
                        continue;
                    }
                    doc.meta.file_path = Some(path.display().to_string());
                    documents.push(doc);
                }
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.display(), e);
                skipped += 1;
            }
        }
    }

    tracing::info!(
        "Loaded {} documents from {} ({} skipped)",
        documents.len(),
        dir.display(),
        skipped
    );
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_extracts_as_single_document() {
        let docs = extract_documents(b"# Title\n\nBody text.", "notes.md").unwrap();
        assert_eq!(docs.len(), 1);
        assert!(docs[0].text.contains("Body text."));
        assert_eq!(docs[0].meta.file_name.as_deref(), Some("notes.md"));
        assert_eq!(docs[0].meta.page, None);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = extract_documents(b"data", "image.png").unwrap_err();
        assert!(matches!(err, ExtractionError::UnsupportedType(ref t) if t == "png"));
    }

    #[test]
    fn invalid_utf8_falls_back_to_lossy() {
        let docs = extract_documents(&[0x48, 0x69, 0xFF], "raw.txt").unwrap();
        assert!(docs[0].text.starts_with("Hi"));
    }
}
