// Classifier instructions and user-facing hints for the step validator.
// All three instructions ask for a single `coherente` / `incoherente` word;
// they differ only in how permissive they are.

use crate::llm_client::prompts::ONE_WORD_ANSWER;

/// Permissive first pass for `criterios`: are these quality criteria at all?
pub const DRIFT_SYSTEM_CRITERIA: &str = "Eres un clasificador en ESPAÑOL. Responde EXACTAMENTE con una sola palabra: \
    'coherente' si la RESPUESTA enumera criterios de calidad, requisitos o condiciones \
    aplicables al OBJETIVO (p. ej., claridad, ejemplos prácticos, precisión, español neutro, \
    pasos accionables), aunque sean genéricos o no repitan el objetivo; \
    'incoherente' si propone un nuevo objetivo/tema o no expresa criterios verificables. \
    No des explicaciones.";

/// Stricter second pass for `criterios`, checked against the whole history.
pub const COHERENCE_SYSTEM_CRITERIA: &str = "Eres un validador en ESPAÑOL. Responde EXACTAMENTE con una sola palabra: \
    'coherente' si la RESPUESTA describe criterios de calidad aplicables al OBJETIVO \
    y no contradice el historial. Acepta variantes en singular/plural y ortografía aproximada \
    (p. ej., 'ejemplo practico' ≈ 'ejemplos prácticos'). \
    'incoherente' si no son criterios, cambian de tema o contradicen el objetivo. No des explicaciones.";

/// Permissive check for `contexto`: profile or audience facts compatible with the objective.
pub const COHERENCE_SYSTEM_CONTEXT: &str = "Eres un validador en ESPAÑOL. Responde EXACTAMENTE con una sola palabra: \
    'coherente' si la RESPUESTA aporta datos de perfil o audiencia (edad, país, rol, nivel, \
    intereses o preferencias) compatibles con el OBJETIVO aunque no lo repita; \
    'incoherente' si es claramente off-topic o contradictorio. No des explicaciones.";

pub const HINT_EMPTY: &str = "Por favor escribe una respuesta.";
pub const HINT_LENGTH: &str =
    "Indica un número o un rango en palabras. Ej.: '400' o '300-500' o '300 a 500 palabras'.";
pub const HINT_CRITERIA_DRIFT: &str = "Escribe criterios de calidad aplicables al objetivo (p. ej., claridad, \
    ejemplos prácticos, español neutro, precisión, pasos accionables) e intenta de nuevo.";
pub const HINT_CRITERIA_INCOHERENT: &str = "No parece un criterio de calidad para este objetivo. Ejemplos: claridad, \
    pasos accionables, ejemplos prácticos, precisión, evitar jerga, fuentes confiables.";
pub const HINT_CONTEXT_INCOHERENT: &str = "No guarda relación con el contexto. Intenta de nuevo.";

pub fn unknown_tone_hint(sorted_tones: &[String]) -> String {
    format!("Tono no reconocido. Usa: {}.", sorted_tones.join(", "))
}

pub fn unknown_format_hint(sorted_formats: &[String]) -> String {
    format!("Formato no reconocido. Usa: {}.", sorted_formats.join(", "))
}

/// User message for the drift check: objective and answer only.
pub fn drift_message(objective: &str, answer: &str) -> String {
    format!("OBJETIVO: {objective}\nRESPUESTA: {answer}\n{ONE_WORD_ANSWER}")
}

/// User message for the coherence checks: the full picture of the session.
pub fn coherence_message(
    question_id: &str,
    objective: &str,
    history_json: &str,
    question: &str,
    answer: &str,
) -> String {
    format!(
        "TIPO_PREGUNTA: {question_id}\n\
         OBJETIVO: {objective}\n\
         CONTEXTO: {history_json}\n\
         PREGUNTA: {question}\n\
         RESPUESTA: {answer}\n\
         {ONE_WORD_ANSWER}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drift_message_layout() {
        assert_eq!(
            drift_message("Aprender python", "claridad"),
            "OBJETIVO: Aprender python\nRESPUESTA: claridad\nResponde solo: coherente | incoherente"
        );
    }

    #[test]
    fn test_coherence_message_has_every_field_in_order() {
        let msg = coherence_message("contexto", "Crear un CV", "{}", "¿Quién eres?", "soy dev");
        let lines: Vec<_> = msg.lines().collect();
        assert_eq!(lines[0], "TIPO_PREGUNTA: contexto");
        assert_eq!(lines[1], "OBJETIVO: Crear un CV");
        assert_eq!(lines[2], "CONTEXTO: {}");
        assert_eq!(lines[3], "PREGUNTA: ¿Quién eres?");
        assert_eq!(lines[4], "RESPUESTA: soy dev");
        assert_eq!(lines[5], ONE_WORD_ANSWER);
    }

    #[test]
    fn test_instructions_ask_for_one_word() {
        for system in [
            DRIFT_SYSTEM_CRITERIA,
            COHERENCE_SYSTEM_CRITERIA,
            COHERENCE_SYSTEM_CONTEXT,
        ] {
            assert!(system.contains("una sola palabra"));
            assert!(!system.contains("  "), "line continuation left double spaces");
        }
    }
}
