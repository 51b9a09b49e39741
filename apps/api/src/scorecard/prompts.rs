// LLM prompt constants for the Scorecard module.

/// Strict rubric judge. Six axes scored 0–5, five penalties, JSON out.
pub const SCORECARD_SYSTEM_STRICT: &str = r#"Eres un evaluador técnico implacable. NO eres amable. Puntúa de 0–5 cada eje y justifica con evidencia textual.
Si no hay evidencia explícita, puntúa 0–2.

Ejes a evaluar del PROMPT (no del output del modelo):
1) Rol: especifica claramente el rol y tareas del asistente; incluye límites y exclusiones.
2) Objetivo: objetivo observable/medible; evita vaguedad.
3) Tono: instruye tono con ejemplos o adjetivos operativos; evita “profesional” sin concreción.
4) Formato: define estructura de salida (listas, campos, JSON) con validaciones.
5) Longitud: fija rango numérico (p.ej. 180–220 palabras) y qué hacer si se excede.
6) Calidad: criterios verificables (claridad, precisión, chequeos, fuentes) con señales de verificación.

Rúbrica (0–5 por eje):
5: Cumple totalmente y de forma operativa; incluye ejemplos/reglas/umbrales.
4: Cumple casi todo; una ambigüedad menor.
3: Aceptable pero con vacíos relevantes (p.ej. sin ejemplos ni rangos).
2: Parcial; vago o difícil de ejecutar.
1: Apenas presente; muy ambiguo.
0: Ausente o contradictorio.

Penalizaciones (aplica TODAS las que correspondan):
- Ambigüedad (“claro”, “formal”) sin definición operativa: −1
- Falta de rangos o umbrales numéricos cuando corresponden: −1
- Ortografía/gramática en el prompt: −1
- Falta de audiencia/usuario objetivo: −1
- Riesgo de incumplir requerimientos (formato, longitud) por falta de instrucciones: −1

Salida en JSON:
{
  "critique": "... sin cortesía, directo ...",
  "criteria": {"Rol": n, "Objetivo": n, "Tono": n, "Formato": n, "Longitud": n, "Calidad": n},
  "penalties": {"Ambiguedad": k, "SinUmbrales": k, "Ortografia": k, "SinAudiencia": k, "RiesgoFormato": k},
  "total_raw": sum(criteria),
  "total_final": total_raw - sum(penalizaciones),
  "max": 30
}
No redondees hacia arriba. Si dudas entre dos notas, elige la más BAJA.
"#;

/// Replace `{prompt}` before sending.
pub const SCORECARD_USER_TEMPLATE: &str = "Evalúa el siguiente PROMPT según la rúbrica estricta y responde SOLO en JSON:

=== PROMPT A EVALUAR ===
{prompt}
=== FIN ===";

pub fn scorecard_user_message(prompt: &str) -> String {
    SCORECARD_USER_TEMPLATE.replace("{prompt}", prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_wraps_prompt_between_markers() {
        let msg = scorecard_user_message("Actúa como asesor.");
        assert!(msg.ends_with("=== PROMPT A EVALUAR ===\nActúa como asesor.\n=== FIN ==="));
        assert!(msg.starts_with("Evalúa el siguiente PROMPT"));
    }

    #[test]
    fn test_rubric_names_every_axis_and_penalty() {
        for name in [
            "\"Rol\"",
            "\"Objetivo\"",
            "\"Tono\"",
            "\"Formato\"",
            "\"Longitud\"",
            "\"Calidad\"",
            "\"Ambiguedad\"",
            "\"SinUmbrales\"",
            "\"Ortografia\"",
            "\"SinAudiencia\"",
            "\"RiesgoFormato\"",
        ] {
            assert!(SCORECARD_SYSTEM_STRICT.contains(name), "missing {name}");
        }
    }
}
