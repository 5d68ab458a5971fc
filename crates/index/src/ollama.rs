use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::client::{expect_dimensions, expect_success, http_client};
use crate::traits::{Embedder, EmbeddingError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Embedding backend for a local Ollama instance (`/api/embed`).
pub struct OllamaEmbedder {
    client: Client,
    url: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbedder {
    pub fn new(url: String, model: String, dimensions: usize) -> Self {
        Self {
            client: http_client(REQUEST_TIMEOUT),
            url,
            model,
            dimensions,
        }
    }
}

#[derive(Deserialize)]
struct EmbedReply {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let response = self
            .client
            .post(format!("{}/api/embed", self.url))
            .json(&json!({ "model": self.model, "input": texts }))
            .send()
            .await?;
        let response = expect_success(response, "ollama").await?;

        let parsed: EmbedReply = response.json().await?;

        if parsed.embeddings.len() != texts.len() {
            return Err(EmbeddingError::Api(format!(
                "ollama returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }
        expect_dimensions(&parsed.embeddings, self.dimensions)?;
        Ok(parsed.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
