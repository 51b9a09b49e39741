//! Scorecard Engine: strict rubric scoring of a composed prompt.
//!
//! Pipeline:
//!   1. judge call through `LlmGateway` (strict rubric system instruction)
//!   2. `JudgeOutput::parse` (parsed / repaired / fallback, never errors)
//!   3. `postprocess`: per-axis clamp, penalty subtraction, strict cap
//!
//! The per-axis values are the only numeric authority. Totals reported by
//! the judge are ignored and recomputed here.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::llm_client::{GenerationRequest, LlmError, LlmGateway};
use crate::scorecard::parser::JudgeOutput;
use crate::scorecard::prompts::{scorecard_user_message, SCORECARD_SYSTEM_STRICT};

pub const AXIS_MAX: u32 = 5;
pub const SCORE_MAX: u32 = 30;
/// Ceiling on `total_final` when any axis is weak.
pub const STRICT_CAP: u32 = 20;
/// An axis at or below this score is "weak" and triggers the cap.
pub const WEAK_AXIS_SCORE: u32 = 2;

// ────────────────────────────────────────────────────────────────────────────
// Axes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Axis {
    Rol,
    Objetivo,
    Tono,
    Formato,
    Longitud,
    Calidad,
}

impl Axis {
    pub const ALL: [Axis; 6] = [
        Axis::Rol,
        Axis::Objetivo,
        Axis::Tono,
        Axis::Formato,
        Axis::Longitud,
        Axis::Calidad,
    ];

    /// Key used by the judge.
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Rol => "Rol",
            Axis::Objetivo => "Objetivo",
            Axis::Tono => "Tono",
            Axis::Formato => "Formato",
            Axis::Longitud => "Longitud",
            Axis::Calidad => "Calidad",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scorecard
// ────────────────────────────────────────────────────────────────────────────

/// Post-processed judge verdict.
///
/// Invariants: every axis in `0..=5`, `total_raw` is their sum,
/// `total_final <= total_raw`, and `total_final <= 20` if any axis is `<= 2`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scorecard {
    pub critique: String,
    pub criteria: BTreeMap<Axis, u32>,
    pub penalties: BTreeMap<String, u32>,
    pub total_raw: u32,
    pub total_final: u32,
    pub max: u32,
    /// `<provider>_strict`
    pub mode: String,
}

impl Scorecard {
    pub fn axis(&self, axis: Axis) -> u32 {
        self.criteria.get(&axis).copied().unwrap_or(0)
    }

    pub fn has_weak_axis(&self) -> bool {
        Axis::ALL.iter().any(|a| self.axis(*a) <= WEAK_AXIS_SCORE)
    }
}

/// Normalizes a judge object into a `Scorecard`. Total over any input.
pub fn postprocess(judge: &Map<String, Value>, provider: &str) -> Scorecard {
    let raw_criteria = judge.get("criteria").and_then(Value::as_object);
    let criteria: BTreeMap<Axis, u32> = Axis::ALL
        .iter()
        .map(|axis| {
            let score = raw_criteria
                .and_then(|c| c.get(axis.as_str()))
                .and_then(coerce_int)
                .unwrap_or(0)
                .clamp(0, AXIS_MAX as i64);
            (*axis, score as u32)
        })
        .collect();

    // Non-numeric penalties are dropped, negative ones count as zero.
    let penalties: BTreeMap<String, u32> = judge
        .get("penalties")
        .and_then(Value::as_object)
        .map(|p| {
            p.iter()
                .filter_map(|(name, value)| {
                    let points = numeric_int(value)?.clamp(0, u32::MAX as i64);
                    Some((name.clone(), points as u32))
                })
                .collect()
        })
        .unwrap_or_default();

    let total_raw: u32 = criteria.values().sum();
    let pen_total: u32 = penalties.values().fold(0u32, |acc, p| acc.saturating_add(*p));

    let mut scorecard = Scorecard {
        critique: critique_text(judge.get("critique")),
        criteria,
        penalties,
        total_raw,
        total_final: total_raw.saturating_sub(pen_total),
        max: SCORE_MAX,
        mode: format!("{provider}_strict"),
    };
    if scorecard.has_weak_axis() {
        scorecard.total_final = scorecard.total_final.min(STRICT_CAP);
    }
    scorecard
}

/// Runs the judge on `prompt` and post-processes the reply.
///
/// `model` is a hint for the backend; `credential` overrides the configured
/// Gemini key for this call only.
pub async fn score(
    llm: &LlmGateway,
    prompt: &str,
    model: Option<String>,
    credential: Option<String>,
) -> Result<Scorecard, LlmError> {
    let request = GenerationRequest::new(scorecard_user_message(prompt))
        .with_system(SCORECARD_SYSTEM_STRICT)
        .with_model(model)
        .with_credential(credential);

    let generation = llm.generate(request).await?;
    let judged = JudgeOutput::parse(&generation.text);
    debug!(provider = %generation.provider, stage = judged.stage(), "judge output parsed");

    let scorecard = postprocess(&judged.into_object(), &generation.provider);
    info!(
        provider = %generation.provider,
        total_raw = scorecard.total_raw,
        total_final = scorecard.total_final,
        "Prompt scored"
    );
    Ok(scorecard)
}

/// Integer view of an axis value: numbers truncate toward zero, numeric
/// strings are accepted.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        other => numeric_int(other),
    }
}

/// Integer view of a JSON number only.
fn numeric_int(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64()
        .or_else(|| n.as_u64().map(|u| u.min(i64::MAX as u64) as i64))
        .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
}

fn critique_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::llm_client::mock::MockBackend;

    fn judge(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(object) => object,
            other => panic!("fixture must be an object, got {other}"),
        }
    }

    #[test]
    fn test_perfect_scores_are_not_capped() {
        let sc = postprocess(
            &judge(json!({
                "criteria": {"Rol": 5, "Objetivo": 5, "Tono": 5, "Formato": 5, "Longitud": 5, "Calidad": 5},
                "penalties": {}
            })),
            "gemini",
        );
        assert_eq!(sc.total_raw, 30);
        assert_eq!(sc.total_final, 30);
        assert_eq!(sc.max, 30);
        assert_eq!(sc.mode, "gemini_strict");
    }

    #[test]
    fn test_weak_axis_caps_after_penalties() {
        let sc = postprocess(
            &judge(json!({
                "criteria": {"Rol": 5, "Objetivo": 5, "Tono": 5, "Formato": 5, "Longitud": 5, "Calidad": 2},
                "penalties": {"Ortografia": 1}
            })),
            "gemini",
        );
        assert_eq!(sc.total_raw, 27);
        assert_eq!(sc.total_final, 20);
    }

    #[test]
    fn test_penalties_subtract_without_cap() {
        let sc = postprocess(
            &judge(json!({
                "criteria": {"Rol": 4, "Objetivo": 4, "Tono": 3, "Formato": 3, "Longitud": 3, "Calidad": 3},
                "penalties": {"Ambiguedad": 1, "SinUmbrales": 1}
            })),
            "ollama",
        );
        assert_eq!(sc.total_raw, 20);
        assert_eq!(sc.total_final, 18);
        assert_eq!(sc.mode, "ollama_strict");
    }

    #[test]
    fn test_axes_are_clamped_and_coerced() {
        let sc = postprocess(
            &judge(json!({
                "criteria": {"Rol": 9, "Objetivo": -3, "Tono": "4", "Formato": 3.9, "Longitud": "mucho", "Calidad": null}
            })),
            "gemini",
        );
        assert_eq!(sc.axis(Axis::Rol), 5);
        assert_eq!(sc.axis(Axis::Objetivo), 0);
        assert_eq!(sc.axis(Axis::Tono), 4);
        assert_eq!(sc.axis(Axis::Formato), 3);
        assert_eq!(sc.axis(Axis::Longitud), 0);
        assert_eq!(sc.axis(Axis::Calidad), 0);
        assert_eq!(sc.total_raw, 12);
        assert_eq!(sc.criteria.len(), 6);
    }

    #[test]
    fn test_judge_totals_are_ignored() {
        let sc = postprocess(
            &judge(json!({
                "criteria": {"Rol": 1},
                "total_raw": 30,
                "total_final": 30
            })),
            "gemini",
        );
        assert_eq!(sc.total_raw, 1);
        assert_eq!(sc.total_final, 1);
    }

    #[test]
    fn test_non_numeric_and_negative_penalties() {
        let sc = postprocess(
            &judge(json!({
                "criteria": {"Rol": 5, "Objetivo": 5, "Tono": 5, "Formato": 5, "Longitud": 5, "Calidad": 5},
                "penalties": {"Ambiguedad": "1", "Ortografia": -2, "SinAudiencia": 1.7, "RiesgoFormato": true}
            })),
            "gemini",
        );
        assert_eq!(sc.penalties.len(), 2);
        assert_eq!(sc.penalties["Ortografia"], 0);
        assert_eq!(sc.penalties["SinAudiencia"], 1);
        assert_eq!(sc.total_final, 29);
    }

    #[test]
    fn test_penalties_never_go_below_zero() {
        let sc = postprocess(
            &judge(json!({
                "criteria": {"Rol": 3, "Objetivo": 3, "Tono": 3, "Formato": 3, "Longitud": 3, "Calidad": 3},
                "penalties": {"Ambiguedad": 50}
            })),
            "gemini",
        );
        assert_eq!(sc.total_final, 0);
    }

    #[test]
    fn test_invariants_hold_over_varied_inputs() {
        let values = [json!(-7), json!(0), json!(2), json!(3), json!(5), json!(11), json!("x")];
        for (i, v) in values.iter().enumerate() {
            for pen in [json!(0), json!(1), json!(4)] {
                let criteria: Map<String, Value> = Axis::ALL
                    .iter()
                    .enumerate()
                    .map(|(j, a)| {
                        let value = if j == i % 6 { v.clone() } else { json!(4) };
                        (a.as_str().to_string(), value)
                    })
                    .collect();
                let sc = postprocess(
                    &judge(json!({"criteria": criteria, "penalties": {"Ambiguedad": pen}})),
                    "gemini",
                );
                assert!(sc.criteria.values().all(|s| *s <= AXIS_MAX));
                assert_eq!(sc.total_raw, sc.criteria.values().sum::<u32>());
                assert!(sc.total_final <= sc.total_raw);
                if sc.has_weak_axis() {
                    assert!(sc.total_final <= STRICT_CAP);
                }
            }
        }
    }

    #[test]
    fn test_fallback_object_scores_zero() {
        let sc = postprocess(
            &JudgeOutput::parse("sin json").into_object(),
            "gemini",
        );
        assert_eq!(sc.critique, "sin json");
        assert_eq!(sc.total_raw, 0);
        assert_eq!(sc.total_final, 0);
    }

    #[tokio::test]
    async fn test_score_sends_rubric_and_parses_fenced_reply() {
        let backend = MockBackend::new("gemini").with_response(
            "```json\n{\"critique\": \"Falta rango\", \"criteria\": {\"Rol\": 4, \"Objetivo\": 4, \"Tono\": 3, \"Formato\": 4, \"Longitud\": 2, \"Calidad\": 3}, \"penalties\": {\"SinUmbrales\": 1}}\n```",
        );
        let llm = LlmGateway::new().with_backend(Arc::new(backend.clone()));

        let sc = score(
            &llm,
            "Actúa como asesor.",
            Some("gemini-1.5-pro".to_string()),
            Some("user-key".to_string()),
        )
        .await
        .unwrap();

        assert_eq!(sc.critique, "Falta rango");
        assert_eq!(sc.total_raw, 20);
        assert_eq!(sc.total_final, 19);
        assert_eq!(sc.mode, "gemini_strict");

        let call = &backend.calls()[0];
        assert_eq!(call.system.as_deref(), Some(SCORECARD_SYSTEM_STRICT));
        assert!(call.prompt.contains("=== PROMPT A EVALUAR ===\nActúa como asesor.\n=== FIN ==="));
        assert_eq!(call.model.as_deref(), Some("gemini-1.5-pro"));
        assert_eq!(call.credential.as_deref(), Some("user-key"));
    }

    #[tokio::test]
    async fn test_score_without_provider_is_unavailable() {
        let err = score(&LlmGateway::new(), "prompt", None, None)
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }
}
