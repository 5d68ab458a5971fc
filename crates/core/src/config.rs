use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f32(key: &str, default: f32) -> f32 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub knowledge: KnowledgeConfig,
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
    pub ollama: OllamaConfig,
    pub embedding: EmbeddingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            knowledge: KnowledgeConfig::default(),
            retrieval: RetrievalConfig::default(),
            llm: LlmConfig::default(),
            ollama: OllamaConfig::default(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Unset variables fall back to the `Default` values.
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            knowledge: KnowledgeConfig::from_env(),
            retrieval: RetrievalConfig::from_env(),
            llm: LlmConfig::from_env(),
            ollama: OllamaConfig::from_env(),
            embedding: EmbeddingConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  server:     {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  knowledge:  dir={}, max_chars={}, overlap_chars={}",
            self.knowledge.dir.display(),
            self.knowledge.max_chars,
            self.knowledge.overlap_chars
        );
        tracing::info!(
            "  retrieval:  top_k={}, threshold={}, preview={}",
            self.retrieval.top_k,
            self.retrieval.similarity_threshold,
            self.retrieval.preview_chars
        );
        tracing::info!("  llm:        provider={}", self.llm.provider);
        tracing::info!("  ollama:     url={}, model={}", self.ollama.url, self.ollama.model);
        tracing::info!(
            "  embedding:  provider={}, dimensions={}",
            self.embedding.provider,
            self.embedding.dimensions
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
        }
    }
}

impl ServerConfig {
    fn from_env() -> Self {
        let d = Self::default();
        Self {
            host: env_or("HOST", &d.host),
            port: env_u16("PORT", d.port),
        }
    }
}

// ── Knowledge base / chunking ─────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Directory scanned for .md/.txt/.pdf documents.
    pub dir: PathBuf,
    /// Maximum characters per chunk.
    pub max_chars: usize,
    /// Overlap characters carried between adjacent chunks.
    pub overlap_chars: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data/knowledge_base"),
            max_chars: 512,
            overlap_chars: 50,
        }
    }
}

impl KnowledgeConfig {
    fn from_env() -> Self {
        let d = Self::default();
        Self {
            dir: env_opt("KNOWLEDGE_DIR").map(PathBuf::from).unwrap_or(d.dir),
            max_chars: env_usize("CHUNK_MAX_CHARS", d.max_chars),
            overlap_chars: env_usize("CHUNK_OVERLAP_CHARS", d.overlap_chars),
        }
    }
}

// ── Retrieval ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of candidates fetched per query.
    pub top_k: usize,
    /// Minimum similarity for a candidate to be disclosed as a source.
    pub similarity_threshold: f32,
    /// Source preview truncation length in characters.
    pub preview_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            similarity_threshold: 0.4,
            preview_chars: 200,
        }
    }
}

impl RetrievalConfig {
    fn from_env() -> Self {
        let d = Self::default();
        Self {
            top_k: env_usize("TOP_K", d.top_k),
            similarity_threshold: env_f32("SIMILARITY_THRESHOLD", d.similarity_threshold),
            preview_chars: env_usize("SOURCE_PREVIEW_CHARS", d.preview_chars),
        }
    }
}

// ── LLM (OpenAI-compatible / Ollama) ──────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "openai" or "ollama"
    pub provider: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Request timeout for LLM calls — the only cancellation mechanism.
    pub timeout_secs: u32,
    pub system_prompt: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            openai_api_key: None,
            openai_model: "gpt-4o-mini".to_string(),
            openai_base_url: None,
            temperature: 0.1,
            max_tokens: 4096,
            timeout_secs: 120,
            system_prompt: None,
        }
    }
}

impl LlmConfig {
    fn from_env() -> Self {
        let d = Self::default();
        Self {
            provider: env_or("LLM_PROVIDER", &d.provider),
            openai_api_key: env_opt("OPENAI_API_KEY"),
            openai_model: env_or("OPENAI_MODEL", &d.openai_model),
            openai_base_url: env_opt("OPENAI_BASE_URL"),
            temperature: env_f32("LLM_TEMPERATURE", d.temperature),
            max_tokens: env_u32("LLM_MAX_TOKENS", d.max_tokens),
            timeout_secs: env_u32("LLM_TIMEOUT_SECS", d.timeout_secs),
            system_prompt: env_opt("SYSTEM_PROMPT"),
        }
    }

    pub fn is_configured(&self) -> bool {
        match self.provider.as_str() {
            "openai" => self.openai_api_key.is_some(),
            "ollama" => true,
            _ => false,
        }
    }

    /// Model label for health reporting.
    pub fn model_label(&self, ollama: &OllamaConfig) -> String {
        match self.provider.as_str() {
            "openai" => self.openai_model.clone(),
            _ => ollama.model.clone(),
        }
    }
}

// ── Ollama (local models) ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub url: String,
    pub model: String,
    pub embedding_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
        }
    }
}

impl OllamaConfig {
    fn from_env() -> Self {
        let d = Self::default();
        Self {
            url: env_or("OLLAMA_URL", &d.url),
            model: env_or("OLLAMA_MODEL", &d.model),
            embedding_model: env_or("OLLAMA_EMBEDDING_MODEL", &d.embedding_model),
        }
    }
}

// ── Embedding ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama" or "openai"
    pub provider: String,
    pub dimensions: u32,
    pub batch_size: u32,
    pub openai_model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            dimensions: 768,
            batch_size: 64,
            openai_model: "text-embedding-3-small".to_string(),
        }
    }
}

impl EmbeddingConfig {
    fn from_env() -> Self {
        let d = Self::default();
        Self {
            provider: env_or("EMBEDDING_PROVIDER", &d.provider),
            dimensions: env_u32("EMBEDDING_DIMENSIONS", d.dimensions),
            batch_size: env_u32("EMBEDDING_BATCH_SIZE", d.batch_size),
            openai_model: env_or("OPENAI_EMBEDDING_MODEL", &d.openai_model),
        }
    }
}
