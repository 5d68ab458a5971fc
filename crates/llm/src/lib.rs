pub mod prompt;
pub mod provider;
pub mod providers;
pub mod synth;

pub use prompt::{Mode, DEFAULT_LEARNER_PROFILE, DEFAULT_SYSTEM_PROMPT};
pub use provider::{LlmError, LlmProvider, Message, Role, TokenStream};
pub use providers::create_provider;
pub use synth::{SynthesisResult, Synthesizer};
