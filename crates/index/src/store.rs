//! In-memory vector index over embedded chunks.
//!
//! Rows live for the lifetime of the process; persistence of the index is
//! deliberately out of scope. Search is exact cosine similarity over all
//! rows, which is plenty for knowledge bases of a few thousand chunks.

use serde::Serialize;
use thiserror::Error;

use lehrbuch_ingest::chunker::ChunkRecord;
use lehrbuch_ingest::DocumentMeta;

use crate::traits::{Embedder, EmbeddingError};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("embedding backend returned {got} vectors for {expected} texts")]
    CountMismatch { expected: usize, got: usize },
}

/// A stored chunk returned from a similarity search.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedCandidate {
    pub text: String,
    /// Cosine similarity against the query. `None` means the score is
    /// genuinely unknown — it is never defaulted to zero.
    pub score: Option<f32>,
    pub section_title: Option<String>,
    pub chunk_index: usize,
    pub meta: DocumentMeta,
}

struct IndexedChunk {
    text: String,
    section_title: Option<String>,
    chunk_index: usize,
    meta: DocumentMeta,
    embedding: Vec<f32>,
}

/// In-memory chunk store with cosine-similarity search.
pub struct VectorIndex {
    rows: Vec<IndexedChunk>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Insert one chunk with its embedding.
    pub fn insert(&mut self, record: ChunkRecord, embedding: Vec<f32>) {
        self.rows.push(IndexedChunk {
            text: record.text,
            section_title: record.section_title,
            chunk_index: record.index,
            meta: record.meta,
            embedding,
        });
    }

    /// Embed all chunk records in batches and build an index from them.
    pub async fn build(
        records: Vec<ChunkRecord>,
        embedder: &dyn Embedder,
        batch_size: usize,
    ) -> Result<Self, IndexError> {
        let batch_size = batch_size.max(1);
        let mut index = Self::new();

        for batch in records.chunks(batch_size) {
            let texts: Vec<&str> = batch.iter().map(|r| r.text.as_str()).collect();
            let vectors = embedder.embed_batch(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(IndexError::CountMismatch {
                    expected: batch.len(),
                    got: vectors.len(),
                });
            }
            for (record, embedding) in batch.iter().cloned().zip(vectors) {
                index.insert(record, embedding);
            }
        }

        tracing::info!("Vector index built: {} chunks", index.len());
        Ok(index)
    }

    /// Return the `k` highest-similarity candidates, descending by score.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<RetrievedCandidate> {
        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .rows
            .iter()
            .map(|row| (cosine_similarity(query, &row.embedding), row))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(k)
            .map(|(score, row)| RetrievedCandidate {
                text: row.text.clone(),
                score: Some(score),
                section_title: row.section_title.clone(),
                chunk_index: row.chunk_index,
                meta: row.meta.clone(),
            })
            .collect()
    }
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self::new()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn record(text: &str, index: usize) -> ChunkRecord {
        ChunkRecord {
            index,
            text: text.to_string(),
            section_title: None,
            meta: DocumentMeta::default(),
        }
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn search_returns_descending_top_k() {
        let mut index = VectorIndex::new();
        index.insert(record("east", 0), vec![1.0, 0.0]);
        index.insert(record("north", 1), vec![0.0, 1.0]);
        index.insert(record("northeast", 2), vec![1.0, 1.0]);

        let results = index.search(&[1.0, 0.0], 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "east");
        assert_eq!(results[1].text, "northeast");
        assert!(results[0].score.unwrap() > results[1].score.unwrap());
    }

    #[test]
    fn search_with_large_k_returns_all_rows() {
        let mut index = VectorIndex::new();
        index.insert(record("only", 0), vec![0.5, 0.5]);
        let results = index.search(&[1.0, 0.0], 10);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn empty_index_searches_empty() {
        let index = VectorIndex::new();
        assert!(index.search(&[1.0, 0.0], 5).is_empty());
        assert!(index.is_empty());
    }

    struct FixedEmbedder;

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn build_embeds_in_batches() {
        let records = vec![record("a", 0), record("bb", 1), record("ccc", 2)];
        let index = VectorIndex::build(records, &FixedEmbedder, 2).await.unwrap();
        assert_eq!(index.len(), 3);
        let results = index.search(&[3.0, 1.0], 1);
        assert_eq!(results[0].text, "ccc");
    }
}
