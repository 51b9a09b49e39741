mod analytics;
mod config;
mod db;
mod errors;
mod guide;
mod improve;
mod llm_client;
mod routes;
mod scorecard;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analytics::geo::{GeoResolver, DEFAULT_GEO_BASE_URL};
use crate::config::Config;
use crate::db::create_pool;
use crate::errors::panic_response;
use crate::llm_client::gemini::GeminiBackend;
use crate::llm_client::ollama::OllamaBackend;
use crate::llm_client::LlmGateway;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails only on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting GuíaIA API v{}", env!("CARGO_PKG_VERSION"));

    // LLM backends, tried in this order
    let llm = build_gateway(&config)?;
    let providers = llm.available_providers();
    if providers.is_empty() {
        warn!("No LLM provider configured: scoring and improve will answer 503 unless a request supplies an api_key");
    } else {
        info!("LLM providers available: {}", providers.join(", "));
    }

    // Analytics storage is optional
    let db = match &config.database_url {
        Some(url) => Some(create_pool(url).await?),
        None => {
            warn!("DATABASE_URL not set, analytics disabled");
            None
        }
    };

    let geo = GeoResolver::new(DEFAULT_GEO_BASE_URL, config.geo_timeout, config.demo_mode)?;
    if config.demo_mode {
        info!("Demo mode: GeoIP answers with a fixed location");
    }

    let state = AppState {
        config: config.clone(),
        llm,
        db,
        geo,
    };

    let app = build_router(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Ollama first, then Gemini.
fn build_gateway(config: &Config) -> Result<LlmGateway> {
    let ollama = OllamaBackend::new(
        config.ollama_host.clone(),
        config.ollama_model.clone(),
        config.ollama_enabled,
        config.llm_timeout,
    )?;
    let gemini = GeminiBackend::new(
        config.gemini_base_url.clone(),
        config.gemini_api_key.clone(),
        config.gemini_text_model.clone(),
        config.llm_timeout,
    )?;

    Ok(LlmGateway::new()
        .with_backend(Arc::new(ollama))
        .with_backend(Arc::new(gemini))
        .with_classifier_model(config.gemini_validator_model.clone()))
}
