//! Step Validator: two-phase validation of one guide answer.
//!
//! Phase 1 (rules): cheap deterministic checks, no model call.
//! Phase 2 (semantics): one-word LLM classification, only for `contexto`
//! and `criterios`, and only when phase 1 passed.
//!
//! CRITICAL: for `criterios` the drift check runs first and the stricter
//! history check is never issued when the drift check rejects.
//!
//! Classifier policy is asymmetric on purpose:
//! - no model reachable → `coherente` (availability never blocks the guide)
//! - model answered something unparseable, or nothing → `""` → rejected
//! - provider refused the request (bad key, 4xx) → `""` → rejected

use tracing::{debug, warn};

use crate::guide::models::{AnswerHistory, ValidationResult};
use crate::guide::normalize::{
    is_allowed_format, is_allowed_tone, looks_like_length, normalize_objective,
    sorted_vocabulary, ALLOWED_FORMATS, ALLOWED_TONES,
};
use crate::guide::prompts::{
    coherence_message, drift_message, unknown_format_hint, unknown_tone_hint,
    COHERENCE_SYSTEM_CONTEXT, COHERENCE_SYSTEM_CRITERIA, DRIFT_SYSTEM_CRITERIA,
    HINT_CONTEXT_INCOHERENT, HINT_CRITERIA_DRIFT, HINT_CRITERIA_INCOHERENT, HINT_EMPTY,
    HINT_LENGTH,
};
use crate::guide::questions::{question_label, QuestionId};
use crate::llm_client::{LlmGateway, Verdict};

/// Validates one answer against its question and the session so far.
///
/// Never fails: rejections come back as `ok = false` with a hint.
/// Unknown question ids pass once the answer is non-empty.
pub async fn validate_step(
    llm: &LlmGateway,
    question_id: &str,
    answer: &str,
    history: &AnswerHistory,
) -> ValidationResult {
    let answer = answer.trim();

    let rules = validate_rules(question_id, answer);
    if !rules.ok {
        debug!(question_id, "answer rejected by rules");
        return rules;
    }

    match QuestionId::parse(question_id) {
        Some(QuestionId::Criteria) => validate_criteria(llm, answer, history).await,
        Some(QuestionId::Context) => validate_context(llm, answer, history).await,
        _ => rules,
    }
}

/// Phase 1. Pure and synchronous.
pub fn validate_rules(question_id: &str, answer: &str) -> ValidationResult {
    let answer = answer.trim();
    if answer.is_empty() {
        return ValidationResult::rejected(HINT_EMPTY);
    }

    match QuestionId::parse(question_id) {
        Some(QuestionId::Objective) => {
            ValidationResult::accepted().with_value(normalize_objective(answer))
        }
        Some(QuestionId::Tone) if !is_allowed_tone(answer) => {
            let tones = sorted_vocabulary(ALLOWED_TONES);
            ValidationResult::rejected(unknown_tone_hint(&tones)).with_suggestions(tones)
        }
        Some(QuestionId::Format) if !is_allowed_format(answer) => {
            let formats = sorted_vocabulary(ALLOWED_FORMATS);
            ValidationResult::rejected(unknown_format_hint(&formats)).with_suggestions(formats)
        }
        Some(QuestionId::Length) if !looks_like_length(answer) => {
            ValidationResult::rejected(HINT_LENGTH)
        }
        // contexto / criterios: semantics are deferred to phase 2
        _ => ValidationResult::accepted(),
    }
}

async fn validate_criteria(
    llm: &LlmGateway,
    answer: &str,
    history: &AnswerHistory,
) -> ValidationResult {
    let objective = history.get(QuestionId::Objective.as_str()).unwrap_or("");

    // (a) permissive drift check
    let drift = classify(llm, DRIFT_SYSTEM_CRITERIA, &drift_message(objective, answer)).await;
    if drift == Verdict::Incoherent {
        return ValidationResult::rejected(HINT_CRITERIA_DRIFT);
    }

    // (b) stricter coherence check against the whole history
    let question_id = QuestionId::Criteria.as_str();
    let message = coherence_message(
        question_id,
        objective,
        &history.to_json(),
        question_label(question_id),
        answer,
    );
    if classify(llm, COHERENCE_SYSTEM_CRITERIA, &message).await != Verdict::Coherent {
        return ValidationResult::rejected(HINT_CRITERIA_INCOHERENT);
    }

    ValidationResult::accepted()
}

async fn validate_context(
    llm: &LlmGateway,
    answer: &str,
    history: &AnswerHistory,
) -> ValidationResult {
    let objective = history.get(QuestionId::Objective.as_str()).unwrap_or("");
    let question_id = QuestionId::Context.as_str();
    let message = coherence_message(
        question_id,
        objective,
        &history.to_json(),
        question_label(question_id),
        answer,
    );

    if classify(llm, COHERENCE_SYSTEM_CONTEXT, &message).await != Verdict::Coherent {
        return ValidationResult::rejected(HINT_CONTEXT_INCOHERENT);
    }

    ValidationResult::accepted()
}

/// Only "no model reachable" fails open.
async fn classify(llm: &LlmGateway, system: &str, message: &str) -> Verdict {
    match llm.classify_one_word(system, message).await {
        Ok(verdict) => verdict,
        Err(e) if e.is_unavailable() => {
            warn!("Classifier unavailable, accepting answer: {e}");
            Verdict::Coherent
        }
        Err(e) => {
            warn!("Classifier call rejected, treating verdict as unclear: {e}");
            Verdict::Unclear
        }
    }
}
