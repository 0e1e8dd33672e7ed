mod config;
mod errors;
mod export;
mod generation;
mod images;
mod llm_client;
mod optimizer;
mod pipeline;
mod routes;
mod seo;
mod state;
#[cfg(test)]
mod testing;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::images::ReplicateClient;
use crate::llm_client::{AnthropicClient, OpenAiClient};
use crate::pipeline::Pipeline;
use crate::routes::build_router;
use crate::seo::{HeuristicSeoValidator, SeoValidator};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (aborts on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pagesmith API v{}", env!("CARGO_PKG_VERSION"));

    // Text generation: Claude plans and optimizes, GPT-4 drafts sections
    let claude = Arc::new(AnthropicClient::new(config.anthropic_api_key.clone())?);
    let gpt = Arc::new(OpenAiClient::new(config.openai_api_key.clone())?);
    info!(
        "LLM clients initialized (editing: {}, drafting: {})",
        llm_client::CLAUDE_MODEL,
        llm_client::openai::GPT_MODEL
    );

    let images = Arc::new(ReplicateClient::new(config.replicate_api_token.clone())?);
    info!("Image client initialized (model: {})", images::IMAGE_MODEL);

    let validator: Arc<dyn SeoValidator> = Arc::new(HeuristicSeoValidator);
    let pipeline = Arc::new(Pipeline::new(gpt, claude, validator.clone(), images));

    info!("Page artifacts will be written to {}", config.output_dir.display());

    let state = AppState {
        config: config.clone(),
        pipeline,
        validator,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
