use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::client::{expect_dimensions, expect_success, http_client};
use crate::traits::{Embedder, EmbeddingError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Embedding backend for the OpenAI `/v1/embeddings` API, or any
/// compatible server reachable through a custom base URL.
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    dimensions: usize,
}

impl OpenAiEmbedder {
    pub fn new(
        api_key: String,
        model: String,
        base_url: Option<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            client: http_client(REQUEST_TIMEOUT),
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| "https://api.openai.com".to_string()),
            dimensions,
        }
    }
}

#[derive(Deserialize)]
struct EmbeddingData {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({ "model": self.model, "input": texts }))
            .send()
            .await?;
        let response = expect_success(response, "openai").await?;

        let mut parsed: EmbeddingData = response.json().await?;
        // Rows may come back out of order; restore input order.
        parsed.data.sort_by_key(|row| row.index);
        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|row| row.embedding).collect();

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::Api(format!(
                "openai returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        expect_dimensions(&vectors, self.dimensions)?;
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
