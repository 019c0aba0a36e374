//! FinMate - insurance advisor chat widget
//!
//! A Rust backend that drives one chat conversation per page load and
//! forwards each user question to a hosted LLM completion endpoint.

mod api;
mod conversation;
mod llm;
mod runtime;
mod state_machine;
mod system_prompt;

use api::{create_router, AppState};
use llm::LlmConfig;
use runtime::{PromptedCompletionClient, RuntimeManager};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finmate=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let port: u16 = std::env::var("FINMATE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let session_idle = Duration::from_secs(
        std::env::var("FINMATE_SESSION_IDLE_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1800),
    );

    let llm_config = LlmConfig::from_env();
    if llm_config.has_credential() {
        tracing::info!(
            model = %llm_config.model,
            api_url = %llm_config.api_url,
            "Completion service configured"
        );
    } else {
        tracing::warn!(
            api_url = %llm_config.api_url,
            "ANTHROPIC_API_KEY not set; requests will be sent without credentials"
        );
    }

    let service = llm_config.build_service()?;
    let client = Arc::new(PromptedCompletionClient::new(
        service,
        llm_config.max_tokens,
    ));

    // Create application state
    let state = AppState::new(RuntimeManager::new(client));
    state
        .runtime
        .spawn_reaper(SESSION_SWEEP_INTERVAL, session_idle);

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("FinMate server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
