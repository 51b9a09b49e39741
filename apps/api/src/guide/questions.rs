//! The fixed six-question sequence of the guide.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionId {
    Objective,
    Context,
    Tone,
    Format,
    Length,
    Criteria,
}

impl QuestionId {
    /// Order in which the guide asks.
    pub const ALL: [QuestionId; 6] = [
        QuestionId::Objective,
        QuestionId::Context,
        QuestionId::Tone,
        QuestionId::Format,
        QuestionId::Length,
        QuestionId::Criteria,
    ];

    /// Wire id. These are the keys of `AnswerHistory` too.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionId::Objective => "objetivo",
            QuestionId::Context => "contexto",
            QuestionId::Tone => "tono",
            QuestionId::Format => "formato",
            QuestionId::Length => "longitud",
            QuestionId::Criteria => "criterios",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.as_str() == id)
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuestionId::Objective => "¿Qué quieres lograr con este prompt? (ej.: mejorar tu CV para ATS 2025, aprender a cocinar una torta, explicar fracciones a un niño)",
            QuestionId::Context => "¿Quién eres tú o para quién va la respuesta? Incluye datos relevantes (ej.: soy estudiante de 2º año; es para mi familia; público infantil; para un cliente de marketing).",
            QuestionId::Tone => "¿Cómo quieres que suene la respuesta? Puedes elegir o escribir uno: profesional, educativo, técnico, amigable, motivador, formal, informal.",
            QuestionId::Format => "¿En qué forma prefieres la respuesta? (elige o escribe): lista de pasos, texto corrido, tabla comparativa, JSON, resumen.",
            QuestionId::Length => "¿Qué extensión quieres? Puedes escribir un número o un rango en palabras (ej.: 200; 300-500; 300 a 500 palabras).",
            QuestionId::Criteria => "¿Qué condiciones debe cumplir para considerarlo bueno? (ej.: claridad, ejemplos prácticos, español neutro, creatividad, optimizado para ATS, pasos accionables).",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: &'static str,
    pub label: &'static str,
}

pub fn list_questions() -> Vec<Question> {
    QuestionId::ALL
        .iter()
        .map(|q| Question {
            id: q.as_str(),
            label: q.label(),
        })
        .collect()
}

/// Label for a question id; unknown ids are echoed back.
pub fn question_label(id: &str) -> &str {
    QuestionId::parse(id).map(|q| q.label()).unwrap_or(id)
}
