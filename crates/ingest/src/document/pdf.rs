use super::ExtractionError;

/// Extract per-page text from PDF bytes.
///
/// `pdf-extract` returns all text as one string; form feed characters
/// (`\x0C`) typically separate pages. Returns `(page_number, text)` pairs
/// with 1-based page numbers.
pub(crate) fn extract_pdf(bytes: &[u8]) -> Result<Vec<(usize, String)>, ExtractionError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractionError::PdfError(e.to_string()))?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        // Extraction succeeded but found no text (scanned/image PDF).
        return Ok(Vec::new());
    }

    if text.contains('\x0C') {
        Ok(text
            .split('\x0C')
            .enumerate()
            .filter(|(_, page_text)| !page_text.trim().is_empty())
            .map(|(i, page_text)| (i + 1, page_text.trim().to_string()))
            .collect())
    } else {
        Ok(vec![(1, trimmed.to_string())])
    }
}
