use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub version: &'static str,
    pub has_ollama: bool,
    pub has_gemini: bool,
    /// Whether analytics storage is configured.
    pub analytics: bool,
}

/// GET /health, /api/health
/// Reports which LLM backends can serve a request without a per-request key.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let providers = state.llm.available_providers();
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION"),
        has_ollama: providers.contains(&"ollama"),
        has_gemini: providers.contains(&"gemini"),
        analytics: state.db.is_some(),
    })
}
