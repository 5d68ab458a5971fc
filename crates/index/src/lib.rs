mod client;
pub mod ollama;
pub mod openai;
pub mod store;
pub mod traits;

use std::sync::Arc;

use lehrbuch_core::Config;

pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;
pub use store::{IndexError, RetrievedCandidate, VectorIndex};
pub use traits::{Embedder, EmbeddingError};

/// Create the appropriate embedding backend based on config.
pub fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>, EmbeddingError> {
    match config.embedding.provider.as_str() {
        "openai" => {
            let api_key = config.llm.openai_api_key.clone().ok_or_else(|| {
                EmbeddingError::Api("OPENAI_API_KEY not set for embedding provider".into())
            })?;
            Ok(Arc::new(OpenAiEmbedder::new(
                api_key,
                config.embedding.openai_model.clone(),
                config.llm.openai_base_url.clone(),
                config.embedding.dimensions as usize,
            )))
        }
        _ => Ok(Arc::new(OllamaEmbedder::new(
            config.ollama.url.clone(),
            config.ollama.embedding_model.clone(),
            config.embedding.dimensions as usize,
        ))),
    }
}
