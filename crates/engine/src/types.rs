use lehrbuch_index::RetrievedCandidate;
use serde::Serialize;

/// One disclosed source backing an answer. Only candidates at or above
/// the similarity threshold are disclosed; candidates without a score
/// never qualify.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub file_name: String,
    /// Truncated chunk text.
    pub text: String,
    /// Cosine similarity, rounded to 4 decimal places.
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_title: Option<String>,
}

/// Per-stage wall-clock timings. `total_ms` is always the sum of the
/// three stages, never an independent measurement.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Timings {
    pub retrieval_ms: u64,
    pub generation_ms: u64,
    pub postprocess_ms: u64,
    pub total_ms: u64,
}

impl Timings {
    pub fn new(retrieval_ms: u64, generation_ms: u64, postprocess_ms: u64) -> Self {
        Self {
            retrieval_ms,
            generation_ms,
            postprocess_ms,
            total_ms: retrieval_ms + generation_ms + postprocess_ms,
        }
    }
}

/// Result of a batch chat call.
#[derive(Debug, Clone, Serialize)]
pub struct AnswerResult {
    pub answer: String,
    pub sources: Vec<SourceInfo>,
    pub timings: Timings,
}

/// Keep candidates at or above the threshold and shape them for
/// disclosure. A candidate without a score never passes.
pub(crate) fn filter_sources(
    candidates: &[RetrievedCandidate],
    threshold: f32,
    preview_chars: usize,
) -> Vec<SourceInfo> {
    candidates
        .iter()
        .filter_map(|c| {
            let score = c.score.filter(|s| *s >= threshold)?;
            Some(SourceInfo {
                file_name: c
                    .meta
                    .file_name
                    .clone()
                    .or_else(|| c.meta.file_path.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                text: preview(&c.text, preview_chars),
                score: (score * 10_000.0).round() / 10_000.0,
                page: c.meta.page,
                section_title: c.section_title.clone(),
            })
        })
        .collect()
}

pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str("...");
    out
}
