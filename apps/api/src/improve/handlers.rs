use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::AppError;
use crate::guide::handlers::PromptResponse;
use crate::improve::engine::improve_prompt;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ImproveRequest {
    pub prompt: Option<String>,
}

/// POST /improve-online, /api/improve-online
pub async fn handle_improve(
    State(state): State<AppState>,
    body: Option<Json<ImproveRequest>>,
) -> Result<Json<PromptResponse>, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let prompt = req.prompt.as_deref().unwrap_or("").trim();
    if prompt.is_empty() {
        return Err(AppError::Validation("Falta 'prompt'.".to_string()));
    }

    let improved = improve_prompt(
        &state.llm,
        prompt,
        Some(state.config.gemini_improver_model.clone()),
    )
    .await?;

    Ok(Json(PromptResponse { prompt: improved }))
}
