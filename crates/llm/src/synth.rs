use std::sync::Arc;

use lehrbuch_index::RetrievedCandidate;

use crate::prompt::{self, Mode, DEFAULT_SYSTEM_PROMPT};
use crate::provider::{LlmError, LlmProvider, Message, Role, TokenStream};

/// Answer plus the candidates whose text was actually placed in the
/// prompt. Source disclosure downstream filters this list, not the raw
/// retrieval list.
pub struct SynthesisResult {
    pub answer: String,
    pub used: Vec<RetrievedCandidate>,
}

/// Turns a question and retrieved context into a prompt and runs it
/// through the configured provider.
pub struct Synthesizer {
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
    temperature: f32,
    max_tokens: u32,
}

impl Synthesizer {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        system_prompt: Option<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            system_prompt: system_prompt
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            temperature,
            max_tokens,
        }
    }

    fn build_messages(
        &self,
        question: &str,
        mode: Mode,
        learner_profile: Option<&str>,
        candidates: &[RetrievedCandidate],
    ) -> Vec<Message> {
        let context = candidates
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = prompt::render_prompt(
            mode,
            &self.system_prompt,
            learner_profile,
            &context,
            question,
        );
        vec![Message {
            role: Role::User,
            content: prompt,
        }]
    }

    /// Full-answer synthesis.
    pub async fn synthesize(
        &self,
        question: &str,
        mode: Mode,
        learner_profile: Option<&str>,
        candidates: Vec<RetrievedCandidate>,
    ) -> Result<SynthesisResult, LlmError> {
        let messages = self.build_messages(question, mode, learner_profile, &candidates);
        let answer = self
            .provider
            .complete(messages, self.temperature, self.max_tokens)
            .await?;
        Ok(SynthesisResult {
            answer,
            used: candidates,
        })
    }

    /// Streaming synthesis. The returned stream yields answer-text
    /// increments; draining it drives generation.
    pub async fn synthesize_stream(
        &self,
        question: &str,
        mode: Mode,
        learner_profile: Option<&str>,
        candidates: &[RetrievedCandidate],
    ) -> Result<TokenStream, LlmError> {
        let messages = self.build_messages(question, mode, learner_profile, candidates);
        self.provider
            .stream(messages, self.temperature, self.max_tokens)
            .await
    }
}
