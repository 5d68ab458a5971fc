//! Streaming event assembly.
//!
//! A chat stream always emits in this order: zero or more `Token`
//! events, then exactly one `Sources` event, then `Done`. If token
//! generation fails mid-stream, the `Sources` event is replaced by a
//! single `Error` event; `Done` is still emitted last, exactly once.
//! Source filtering runs only once the token stream is fully drained,
//! over the candidate list captured at retrieval time.

use std::pin::Pin;

use futures::{Stream, StreamExt};
use lehrbuch_index::RetrievedCandidate;
use lehrbuch_llm::TokenStream;

use crate::types::{filter_sources, SourceInfo};

#[derive(Debug)]
pub enum ChatStreamEvent {
    Token(String),
    Sources(Vec<SourceInfo>),
    Error(String),
    Done,
}

/// Owned event stream, safe to move into a spawned task.
pub type ChatEventStream = Pin<Box<dyn Stream<Item = ChatStreamEvent> + Send>>;

enum Phase {
    Tokens,
    Done,
    Finished,
}

struct State {
    tokens: TokenStream,
    candidates: Vec<RetrievedCandidate>,
    threshold: f32,
    preview_chars: usize,
    phase: Phase,
}

/// Wrap a token stream and the retrieval-time candidates into the
/// transport event sequence.
pub fn events(
    tokens: TokenStream,
    candidates: Vec<RetrievedCandidate>,
    threshold: f32,
    preview_chars: usize,
) -> impl Stream<Item = ChatStreamEvent> + Send {
    let state = State {
        tokens,
        candidates,
        threshold,
        preview_chars,
        phase: Phase::Tokens,
    };

    futures::stream::unfold(state, |mut state| async move {
        match state.phase {
            Phase::Tokens => match state.tokens.next().await {
                Some(Ok(token)) => Some((ChatStreamEvent::Token(token), state)),
                Some(Err(e)) => {
                    state.phase = Phase::Done;
                    Some((ChatStreamEvent::Error(e.to_string()), state))
                }
                None => {
                    state.phase = Phase::Done;
                    let sources = filter_sources(
                        &state.candidates,
                        state.threshold,
                        state.preview_chars,
                    );
                    Some((ChatStreamEvent::Sources(sources), state))
                }
            },
            Phase::Done => {
                state.phase = Phase::Finished;
                Some((ChatStreamEvent::Done, state))
            }
            Phase::Finished => None,
        }
    })
}
