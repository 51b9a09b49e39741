use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::scorecard::engine::score;
use crate::scorecard::front::FrontPayload;
use crate::state::AppState;

const NO_STORE: &str = "no-store, no-cache, must-revalidate, max-age=0";

#[derive(Debug, Default, Deserialize)]
pub struct ScoreRequest {
    pub prompt: Option<String>,
    /// Model hint; defaults to the configured text model.
    pub model: Option<String>,
    /// Per-request Gemini key.
    pub api_key: Option<String>,
}

/// POST /scorecard, /api/scorecard
pub async fn handle_scorecard(
    State(state): State<AppState>,
    body: Option<Json<ScoreRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let prompt = req.prompt.as_deref().unwrap_or("").trim();
    if prompt.is_empty() {
        return Err(AppError::Validation("Falta 'prompt'.".to_string()));
    }

    let model = req
        .model
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| state.config.gemini_text_model.clone());

    let scorecard = score(&state.llm, prompt, Some(model), req.api_key).await?;

    Ok((
        [(header::CACHE_CONTROL, NO_STORE)],
        Json(FrontPayload::from(&scorecard)),
    ))
}
