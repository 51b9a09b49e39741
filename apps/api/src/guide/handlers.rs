use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::guide::composer::compose_prompt;
use crate::guide::models::{AnswerHistory, ValidationResult};
use crate::guide::questions::{list_questions, Question};
use crate::guide::validator::validate_step;
use crate::state::AppState;

#[derive(Serialize)]
pub struct QuestionsResponse {
    pub questions: Vec<Question>,
}

/// GET /questions, /api/questions
pub async fn handle_questions() -> Json<QuestionsResponse> {
    Json(QuestionsResponse {
        questions: list_questions(),
    })
}

/// Query string form. `history` arrives as a JSON-encoded object.
#[derive(Debug, Default, Deserialize)]
pub struct ValidateStepQuery {
    pub question_id: Option<String>,
    pub qid: Option<String>,
    pub answer: Option<String>,
    pub history: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ValidateStepBody {
    pub question_id: Option<String>,
    pub qid: Option<String>,
    pub answer: Option<String>,
    pub history: Option<AnswerHistory>,
    pub answers_so_far: Option<AnswerHistory>,
}

/// GET /validate-step, /api/validate-step
pub async fn handle_validate_step_get(
    State(state): State<AppState>,
    Query(params): Query<ValidateStepQuery>,
) -> Result<Json<ValidationResult>, AppError> {
    let question_id = pick_question_id(params.question_id, params.qid)?;
    let history = params
        .history
        .as_deref()
        .map(parse_history_param)
        .unwrap_or_default();
    let answer = params.answer.unwrap_or_default();

    Ok(Json(
        validate_step(&state.llm, &question_id, &answer, &history).await,
    ))
}

/// POST /validate-step, /api/validate-step
///
/// A missing or malformed body is treated as empty, which then fails on
/// the missing question id.
pub async fn handle_validate_step_post(
    State(state): State<AppState>,
    body: Option<Json<ValidateStepBody>>,
) -> Result<Json<ValidationResult>, AppError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let question_id = pick_question_id(body.question_id, body.qid)?;
    let history = body
        .history
        .filter(|h| !h.is_empty())
        .or(body.answers_so_far)
        .unwrap_or_default();
    let answer = body.answer.unwrap_or_default();

    Ok(Json(
        validate_step(&state.llm, &question_id, &answer, &history).await,
    ))
}

fn pick_question_id(question_id: Option<String>, qid: Option<String>) -> Result<String, AppError> {
    question_id
        .filter(|q| !q.is_empty())
        .or(qid.filter(|q| !q.is_empty()))
        .ok_or_else(|| AppError::Validation("Falta 'question_id'.".to_string()))
}

fn parse_history_param(raw: &str) -> AnswerHistory {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!("Ignoring malformed history parameter: {e}");
        AnswerHistory::default()
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct ComposeRequest {
    pub answers_clean: Option<AnswerHistory>,
    pub answers: Option<AnswerHistory>,
}

#[derive(Debug, Serialize)]
pub struct PromptResponse {
    pub prompt: String,
}

/// POST /compose-initial, /api/compose-initial
pub async fn handle_compose_initial(body: Option<Json<ComposeRequest>>) -> Json<PromptResponse> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let answers = body
        .answers_clean
        .filter(|a| !a.is_empty())
        .or(body.answers)
        .unwrap_or_default();

    Json(PromptResponse {
        prompt: compose_prompt(&answers),
    })
}
