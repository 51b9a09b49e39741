// LLM prompt constants for the Improve module.

pub const IMPROVER_SYSTEM: &str = "Eres un mejorador de prompts. Reescribe el prompt para que sea claro, completo y accionable. \
    Devuelve SOLO el prompt mejorado en un único bloque, sin comentarios extra, en **máximo 150 palabras**.";
