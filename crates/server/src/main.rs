mod api;
mod router;
mod state;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lehrbuch_core::Config;
use lehrbuch_engine::RagEngine;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    lehrbuch_core::config::load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    let embedder = lehrbuch_index::create_embedder(&config)?;
    let provider = lehrbuch_llm::create_provider(&config)?;
    let model = config.llm.model_label(&config.ollama);

    let engine = Arc::new(RagEngine::new(config.clone(), embedder, provider));

    // Warm the index in the background so startup doesn't block on the
    // knowledge-base scan; the first question waits for it if needed.
    let warm = engine.clone();
    tokio::spawn(async move {
        if let Err(e) = warm.initialize().await {
            error!("Index build failed: {}", e);
        } else {
            info!("Index ready");
        }
    });

    let state = Arc::new(AppState { engine, model });
    let app = router::build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://localhost:{}", config.server.port);
    axum::serve(listener, app).await?;

    Ok(())
}
