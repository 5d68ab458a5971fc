use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;
use tracing::info;

use lehrbuch_core::Config;
use lehrbuch_index::{Embedder, RetrievedCandidate, VectorIndex};
use lehrbuch_ingest::{chunker, load_knowledge_base};
use lehrbuch_llm::{LlmProvider, Mode, Synthesizer, TokenStream};

use crate::error::EngineError;
use crate::stream::{self, ChatEventStream};
use crate::types::{filter_sources, AnswerResult, Timings};

/// Per-request knobs. Defaults mirror the HTTP API's defaults.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub show_sources: bool,
    pub mode: String,
    pub learner_profile: Option<String>,
    /// Overrides the configured similarity threshold for this call.
    pub similarity_threshold: Option<f32>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            show_sources: true,
            mode: "learning".to_string(),
            learner_profile: None,
            similarity_threshold: None,
        }
    }
}

/// Retrieval-augmented answering over an in-memory vector index.
///
/// The index is built lazily on first use and at most once; concurrent
/// callers share the same build.
pub struct RagEngine {
    config: Config,
    embedder: Arc<dyn Embedder>,
    synthesizer: Synthesizer,
    index: OnceCell<VectorIndex>,
}

impl RagEngine {
    pub fn new(
        config: Config,
        embedder: Arc<dyn Embedder>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        let synthesizer = Synthesizer::new(
            provider,
            config.llm.system_prompt.clone(),
            config.llm.temperature,
            config.llm.max_tokens,
        );
        Self {
            config,
            embedder,
            synthesizer,
            index: OnceCell::new(),
        }
    }

    /// Construct with a pre-built index, skipping the knowledge-base
    /// scan on first use.
    pub fn with_index(
        config: Config,
        embedder: Arc<dyn Embedder>,
        provider: Arc<dyn LlmProvider>,
        index: VectorIndex,
    ) -> Self {
        let mut engine = Self::new(config, embedder, provider);
        engine.index = OnceCell::new_with(Some(index));
        engine
    }

    /// Whether the index has been built.
    pub fn is_ready(&self) -> bool {
        self.index.initialized()
    }

    /// Build the index now instead of on the first question.
    pub async fn initialize(&self) -> Result<(), EngineError> {
        self.ensure_index().await.map(|_| ())
    }

    async fn ensure_index(&self) -> Result<&VectorIndex, EngineError> {
        self.index
            .get_or_try_init(|| async {
                let docs = load_knowledge_base(&self.config.knowledge.dir)?;
                let records = chunker::chunk_documents(
                    &docs,
                    self.config.knowledge.max_chars,
                    self.config.knowledge.overlap_chars,
                );
                info!(
                    "Building index: {} documents, {} chunks",
                    docs.len(),
                    records.len()
                );
                let index = VectorIndex::build(
                    records,
                    self.embedder.as_ref(),
                    self.config.embedding.batch_size as usize,
                )
                .await?;
                Ok(index)
            })
            .await
    }

    fn validate(question: &str, mode: &str) -> Result<Mode, EngineError> {
        if question.trim().is_empty() {
            return Err(EngineError::EmptyQuestion);
        }
        mode.parse::<Mode>().map_err(EngineError::InvalidMode)
    }

    async fn retrieve(
        &self,
        index: &VectorIndex,
        question: &str,
    ) -> Result<Vec<RetrievedCandidate>, EngineError> {
        let mut vectors = self.embedder.embed_batch(&[question]).await?;
        if vectors.is_empty() {
            return Err(EngineError::Retrieval(
                lehrbuch_index::EmbeddingError::Api("empty embedding response".to_string()),
            ));
        }
        let query = vectors.swap_remove(0);
        Ok(index.search(&query, self.config.retrieval.top_k))
    }

    fn threshold(&self, override_value: Option<f32>) -> f32 {
        override_value.unwrap_or(self.config.retrieval.similarity_threshold)
    }

    /// Answer a question in one shot, with per-stage timings.
    pub async fn chat(
        &self,
        question: &str,
        opts: &ChatOptions,
    ) -> Result<AnswerResult, EngineError> {
        let mode = Self::validate(question, &opts.mode)?;
        let index = self.ensure_index().await?;

        let retrieval_start = Instant::now();
        let candidates = self.retrieve(index, question).await?;
        let retrieval_ms = retrieval_start.elapsed().as_millis() as u64;

        let generation_start = Instant::now();
        let result = self
            .synthesizer
            .synthesize(
                question,
                mode,
                opts.learner_profile.as_deref(),
                candidates,
            )
            .await?;
        let generation_ms = generation_start.elapsed().as_millis() as u64;

        let postprocess_start = Instant::now();
        let sources = if opts.show_sources {
            filter_sources(
                &result.used,
                self.threshold(opts.similarity_threshold),
                self.config.retrieval.preview_chars,
            )
        } else {
            Vec::new()
        };
        let postprocess_ms = postprocess_start.elapsed().as_millis() as u64;

        Ok(AnswerResult {
            answer: result.answer,
            sources,
            timings: Timings::new(retrieval_ms, generation_ms, postprocess_ms),
        })
    }

    /// Start a streaming answer: the provider's lazy token stream plus
    /// the retrieval-time candidate list. Draining the stream drives
    /// generation; source filtering happens afterwards over these
    /// candidates, never recomputed.
    pub async fn chat_stream(
        &self,
        question: &str,
        opts: &ChatOptions,
    ) -> Result<(TokenStream, Vec<RetrievedCandidate>), EngineError> {
        let mode = Self::validate(question, &opts.mode)?;
        let index = self.ensure_index().await?;

        let candidates = self.retrieve(index, question).await?;
        let tokens = self
            .synthesizer
            .synthesize_stream(question, mode, opts.learner_profile.as_deref(), &candidates)
            .await?;

        Ok((tokens, candidates))
    }

    /// `chat_stream` assembled into the transport event sequence:
    /// tokens, then one sources event, then a terminal done marker.
    /// Errors raised before any token was produced surface as `Err`
    /// here; mid-stream failures become a single error event inside
    /// the stream.
    pub async fn chat_stream_events(
        &self,
        question: &str,
        opts: &ChatOptions,
    ) -> Result<ChatEventStream, EngineError> {
        let (tokens, candidates) = self.chat_stream(question, opts).await?;
        Ok(Box::pin(stream::events(
            tokens,
            candidates,
            self.threshold(opts.similarity_threshold),
            self.config.retrieval.preview_chars,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use futures::StreamExt;

    use crate::stream::ChatStreamEvent;
    use crate::types::preview;

    use lehrbuch_index::{Embedder, EmbeddingError};
    use lehrbuch_ingest::chunker::ChunkRecord;
    use lehrbuch_ingest::DocumentMeta;
    use lehrbuch_llm::{LlmError, Message, TokenStream};

    /// Maps known texts to fixed unit vectors so similarity scores are
    /// exact and predictable.
    struct FixedEmbedder {
        calls: AtomicUsize,
    }

    impl FixedEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        fn vector_for(text: &str) -> Vec<f32> {
            match text {
                t if t.contains("alpha") => vec![1.0, 0.0, 0.0],
                t if t.contains("beta") => vec![0.0, 1.0, 0.0],
                _ => vec![0.0, 0.0, 1.0],
            }
        }
    }

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
        }

        fn dimensions(&self) -> usize {
            3
        }
    }

    struct CannedProvider {
        answer: String,
        tokens: Vec<Result<String, &'static str>>,
    }

    #[async_trait]
    impl lehrbuch_llm::LlmProvider for CannedProvider {
        async fn complete(
            &self,
            _messages: Vec<Message>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<String, LlmError> {
            Ok(self.answer.clone())
        }

        async fn stream(
            &self,
            _messages: Vec<Message>,
            _temperature: f32,
            _max_tokens: u32,
        ) -> Result<TokenStream, LlmError> {
            let items: Vec<Result<String, LlmError>> = self
                .tokens
                .iter()
                .map(|t| match t {
                    Ok(s) => Ok(s.clone()),
                    Err(msg) => Err(LlmError::StreamError((*msg).to_string())),
                })
                .collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }
    }

    fn record(index: usize, text: &str) -> ChunkRecord {
        ChunkRecord {
            index,
            text: text.to_string(),
            section_title: None,
            meta: DocumentMeta {
                file_name: Some(format!("doc{index}.md")),
                file_path: None,
                page: None,
            },
        }
    }

    async fn engine_with(
        records: Vec<ChunkRecord>,
        provider: CannedProvider,
    ) -> (RagEngine, Arc<FixedEmbedder>) {
        let embedder = Arc::new(FixedEmbedder::new());
        let index = VectorIndex::build(records, embedder.as_ref(), 64)
            .await
            .unwrap();
        embedder.calls.store(0, Ordering::SeqCst);
        let engine = RagEngine::with_index(
            Config::default(),
            embedder.clone(),
            Arc::new(provider),
            index,
        );
        (engine, embedder)
    }

    fn canned(answer: &str) -> CannedProvider {
        CannedProvider {
            answer: answer.to_string(),
            tokens: vec![Ok(answer.to_string())],
        }
    }

    #[tokio::test]
    async fn empty_question_fails_before_retrieval() {
        let (engine, embedder) = engine_with(vec![record(0, "alpha facts")], canned("a")).await;
        let err = engine.chat("   ", &ChatOptions::default()).await.unwrap_err();
        assert!(matches!(err, EngineError::EmptyQuestion));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_mode_fails_before_retrieval() {
        let (engine, embedder) = engine_with(vec![record(0, "alpha facts")], canned("a")).await;
        let opts = ChatOptions {
            mode: "verbose".to_string(),
            ..Default::default()
        };
        let err = engine.chat("what is alpha?", &opts).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidMode(m) if m == "verbose"));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn chat_returns_answer_and_filtered_sources() {
        let (engine, _) = engine_with(
            vec![record(0, "alpha facts"), record(1, "beta facts")],
            canned("the answer"),
        )
        .await;

        // Query embeds to the alpha axis: score 1.0 for alpha, 0.0 for beta.
        let result = engine
            .chat("tell me about alpha", &ChatOptions::default())
            .await
            .unwrap();

        assert_eq!(result.answer, "the answer");
        assert_eq!(result.sources.len(), 1);
        assert_eq!(result.sources[0].file_name, "doc0.md");
        assert!((result.sources[0].score - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn show_sources_false_suppresses_disclosure() {
        let (engine, _) = engine_with(vec![record(0, "alpha facts")], canned("a")).await;
        let opts = ChatOptions {
            show_sources: false,
            ..Default::default()
        };
        let result = engine.chat("alpha?", &opts).await.unwrap();
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn threshold_override_applies_per_call() {
        let (engine, _) = engine_with(
            vec![record(0, "alpha facts"), record(1, "beta facts")],
            canned("a"),
        )
        .await;
        // A threshold above 1.0 excludes everything.
        let opts = ChatOptions {
            similarity_threshold: Some(1.1),
            ..Default::default()
        };
        let result = engine.chat("alpha?", &opts).await.unwrap();
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn timings_total_is_sum_of_stages() {
        let (engine, _) = engine_with(vec![record(0, "alpha facts")], canned("a")).await;
        let result = engine.chat("alpha?", &ChatOptions::default()).await.unwrap();
        let t = result.timings;
        assert_eq!(
            t.total_ms,
            t.retrieval_ms + t.generation_ms + t.postprocess_ms
        );
    }

    #[tokio::test]
    async fn concurrent_first_questions_share_one_index_build() {
        let dir =
            std::env::temp_dir().join(format!("lehrbuch-engine-once-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("notes.md"), "alpha facts live here").unwrap();

        let mut config = Config::default();
        config.knowledge.dir = dir.clone();

        let embedder = Arc::new(FixedEmbedder::new());
        let engine = RagEngine::new(config, embedder.clone(), Arc::new(canned("a")));
        assert!(!engine.is_ready());

        let opts = ChatOptions::default();
        let (first, second) = tokio::join!(
            engine.chat("alpha?", &opts),
            engine.chat("more alpha?", &opts)
        );
        first.unwrap();
        second.unwrap();

        // One embedding batch for the build plus one per question; a
        // second build would add a fourth call.
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
        assert!(engine.is_ready());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn stream_emits_tokens_sources_done() {
        let provider = CannedProvider {
            answer: String::new(),
            tokens: vec![Ok("tok1".to_string()), Ok("tok2".to_string())],
        };
        let (engine, _) = engine_with(vec![record(0, "alpha facts")], provider).await;

        let events: Vec<ChatStreamEvent> = engine
            .chat_stream_events("alpha?", &ChatOptions::default())
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 4);
        assert!(matches!(&events[0], ChatStreamEvent::Token(t) if t == "tok1"));
        assert!(matches!(&events[1], ChatStreamEvent::Token(t) if t == "tok2"));
        assert!(matches!(&events[2], ChatStreamEvent::Sources(s) if s.len() == 1));
        assert!(matches!(events[3], ChatStreamEvent::Done));
    }

    #[tokio::test]
    async fn stream_midway_failure_replaces_sources_with_error() {
        let provider = CannedProvider {
            answer: String::new(),
            tokens: vec![Ok("partial".to_string()), Err("backend gone")],
        };
        let (engine, _) = engine_with(vec![record(0, "alpha facts")], provider).await;

        let events: Vec<ChatStreamEvent> = engine
            .chat_stream_events("alpha?", &ChatOptions::default())
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], ChatStreamEvent::Token(t) if t == "partial"));
        assert!(matches!(&events[1], ChatStreamEvent::Error(m) if m.contains("backend gone")));
        assert!(matches!(events[2], ChatStreamEvent::Done));
    }

    #[test]
    fn filter_excludes_unscored_candidates() {
        let candidates = vec![
            RetrievedCandidate {
                text: "scored".to_string(),
                score: Some(0.5),
                section_title: None,
                chunk_index: 0,
                meta: DocumentMeta::default(),
            },
            RetrievedCandidate {
                text: "unscored".to_string(),
                score: None,
                section_title: None,
                chunk_index: 1,
                meta: DocumentMeta::default(),
            },
        ];
        let sources = filter_sources(&candidates, 0.4, 200);
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].file_name, "Unknown");
    }

    #[test]
    fn filter_keeps_scores_at_or_above_threshold() {
        let make = |score: f32| RetrievedCandidate {
            text: "t".to_string(),
            score: Some(score),
            section_title: None,
            chunk_index: 0,
            meta: DocumentMeta::default(),
        };
        let candidates = vec![make(0.9), make(0.5), make(0.4), make(0.3), make(0.1)];
        let sources = filter_sources(&candidates, 0.4, 200);
        let scores: Vec<f32> = sources.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![0.9, 0.5, 0.4]);
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        let text = "ä".repeat(300);
        let out = preview(&text, 200);
        assert_eq!(out.chars().count(), 203);
        assert!(out.ends_with("..."));
    }
}
