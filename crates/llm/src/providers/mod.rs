pub mod ollama;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use lehrbuch_core::Config;

use crate::provider::{LlmError, LlmProvider};

/// Create the appropriate LLM provider based on config.
///
/// The request timeout on the underlying HTTP client is the only
/// cancellation mechanism for generation; callers add no deadline of
/// their own.
pub fn create_provider(config: &Config) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let timeout = Duration::from_secs(u64::from(config.llm.timeout_secs));
    match config.llm.provider.as_str() {
        "openai" => {
            let api_key = config
                .llm
                .openai_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            let base_url = config
                .llm
                .openai_base_url
                .as_deref()
                .unwrap_or("https://api.openai.com");
            Ok(Arc::new(openai::OpenAiProvider::new(
                api_key.clone(),
                config.llm.openai_model.clone(),
                base_url.to_string(),
                timeout,
            )))
        }
        "ollama" => Ok(Arc::new(ollama::OllamaProvider::new(
            config.ollama.url.clone(),
            config.ollama.model.clone(),
            timeout,
        ))),
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{}'",
            other
        ))),
    }
}
