use std::sync::Arc;

use lehrbuch_engine::RagEngine;

pub struct AppState {
    pub engine: Arc<RagEngine>,
    /// Model label reported by the health endpoint.
    pub model: String,
}
