use lehrbuch_index::{EmbeddingError, IndexError};
use lehrbuch_ingest::ExtractionError;
use lehrbuch_llm::LlmError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("question cannot be empty")]
    EmptyQuestion,
    #[error("mode must be 'learning' or 'concise', got '{0}'")]
    InvalidMode(String),
    /// No index is present and the lazy build failed.
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] EmbeddingError),
    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),
}

impl From<ExtractionError> for EngineError {
    fn from(e: ExtractionError) -> Self {
        EngineError::IndexUnavailable(e.to_string())
    }
}

impl From<IndexError> for EngineError {
    fn from(e: IndexError) -> Self {
        EngineError::IndexUnavailable(e.to_string())
    }
}

impl EngineError {
    /// True for errors caused by the request itself rather than the
    /// engine's backends.
    pub fn is_client_error(&self) -> bool {
        matches!(self, EngineError::EmptyQuestion | EngineError::InvalidMode(_))
    }
}
