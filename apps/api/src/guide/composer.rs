use crate::guide::models::AnswerHistory;
use crate::guide::normalize::{normalize_length, normalize_objective};

const DEFAULT_OBJECTIVE_ANSWER: &str = "Mejorar mi CV";
const DEFAULT_CONTEXT: &str = "Usuario general";
const DEFAULT_TONE: &str = "profesional";
const DEFAULT_FORMAT: &str = "lista de pasos";
const DEFAULT_LENGTH_ANSWER: &str = "300 a 500 palabras";
const DEFAULT_CRITERIA: &str = "claridad, concisión, acción concreta";

/// Fills the fixed seven-line template from the session answers.
///
/// Missing answers take their defaults. Objective and length go through
/// their normalizers; everything else is inserted as given.
pub fn compose_prompt(answers: &AnswerHistory) -> String {
    let field = |key: &str, default: &'static str| answers.get(key).unwrap_or(default);

    let objective = normalize_objective(field("objetivo", DEFAULT_OBJECTIVE_ANSWER));
    let context = field("contexto", DEFAULT_CONTEXT);
    let tone = field("tono", DEFAULT_TONE);
    let format = field("formato", DEFAULT_FORMAT);
    let length = normalize_length(field("longitud", DEFAULT_LENGTH_ANSWER));
    let criteria = field("criterios", DEFAULT_CRITERIA);

    format!(
        "Actúa como asesor {tone}.\n\
         Objetivo: {objective}.\n\
         Contexto: {context}.\n\
         Tono: {tone}.\n\
         Formato de salida: {format}.\n\
         Longitud esperada: {length}.\n\
         Criterios de calidad: {criteria}."
    )
}
