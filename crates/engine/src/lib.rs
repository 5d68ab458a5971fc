pub mod engine;
pub mod error;
pub mod stream;
pub mod types;

pub use engine::{ChatOptions, RagEngine};
pub use error::EngineError;
pub use stream::{ChatEventStream, ChatStreamEvent};
pub use types::{AnswerResult, SourceInfo, Timings};
