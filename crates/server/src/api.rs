//! Chat and health endpoints.
//!
//! `/api/chat` answers in one of two shapes depending on the request's
//! `stream` flag: a JSON body with answer, sources and timings, or an
//! SSE stream of `token` events followed by one `sources` event and a
//! terminal `done` marker. A failure after streaming has begun becomes
//! a single `error` event; `done` is still sent last.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use tracing::error;

use lehrbuch_engine::{ChatEventStream, ChatOptions, ChatStreamEvent, EngineError, SourceInfo, Timings};

use crate::state::AppState;

fn default_true() -> bool {
    true
}

fn default_mode() -> String {
    "learning".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    #[serde(default = "default_true")]
    pub show_sources: bool,
    pub similarity_threshold: Option<f32>,
    #[serde(default = "default_mode")]
    pub mode: String,
    pub learner_profile: Option<String>,
    #[serde(default)]
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<SourceInfo>,
    pub query_time_ms: u64,
    pub timings: Timings,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub index_loaded: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let index_loaded = state.engine.is_ready();
    Json(HealthResponse {
        status: if index_loaded { "ok" } else { "initializing" }.to_string(),
        model: state.model.clone(),
        index_loaded,
    })
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Response {
    let opts = ChatOptions {
        show_sources: req.show_sources,
        mode: req.mode,
        learner_profile: req.learner_profile,
        similarity_threshold: req.similarity_threshold,
    };

    if req.stream {
        match state.engine.chat_stream_events(&req.question, &opts).await {
            Ok(events) => sse_response(events),
            Err(e) if e.is_client_error() => error_response(StatusCode::BAD_REQUEST, &e),
            // The response headers are still streamable at this point,
            // so backend failures go out as an error event like any
            // mid-stream failure would.
            Err(e) => {
                error!("Chat stream setup failed: {}", e);
                sse_failure(&e)
            }
        }
    } else {
        match state.engine.chat(&req.question, &opts).await {
            Ok(result) => Json(ChatResponse {
                answer: result.answer,
                sources: result.sources,
                query_time_ms: result.timings.total_ms,
                timings: result.timings,
            })
            .into_response(),
            Err(e) if e.is_client_error() => error_response(StatusCode::BAD_REQUEST, &e),
            Err(e @ EngineError::IndexUnavailable(_)) => {
                error!("Chat failed: {}", e);
                error_response(StatusCode::SERVICE_UNAVAILABLE, &e)
            }
            Err(e) => {
                error!("Chat failed: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, &e)
            }
        }
    }
}

fn error_response(status: StatusCode, err: &EngineError) -> Response {
    (
        status,
        Json(ErrorResponse {
            detail: err.to_string(),
        }),
    )
        .into_response()
}

fn to_sse_event(event: ChatStreamEvent) -> Event {
    match event {
        // JSON-encode the token so newlines survive SSE framing.
        ChatStreamEvent::Token(token) => Event::default()
            .event("token")
            .data(serde_json::Value::String(token).to_string()),
        ChatStreamEvent::Sources(sources) => Event::default()
            .event("sources")
            .data(json!({ "sources": sources }).to_string()),
        ChatStreamEvent::Error(message) => Event::default()
            .event("error")
            .data(json!({ "error": message }).to_string()),
        ChatStreamEvent::Done => Event::default().event("done").data("[DONE]"),
    }
}

/// Bridge the engine's event stream to SSE via a channel.
fn sse_response(mut events: ChatEventStream) -> Response {
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<Event, Infallible>>(32);
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            if tx.send(Ok(to_sse_event(event))).await.is_err() {
                // Client went away; dropping the stream cancels generation.
                break;
            }
        }
    });
    Sse::new(ReceiverStream::new(rx)).into_response()
}

/// A stream that failed before the first token: one error event, then done.
fn sse_failure(err: &EngineError) -> Response {
    let events = futures::stream::iter(vec![
        Ok::<Event, Infallible>(to_sse_event(ChatStreamEvent::Error(err.to_string()))),
        Ok(to_sse_event(ChatStreamEvent::Done)),
    ]);
    Sse::new(events).into_response()
}
