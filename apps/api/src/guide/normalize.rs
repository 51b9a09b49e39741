//! Text normalizers: canonical forms for free-text answers.
//!
//! Pure functions, no I/O. `normalize_objective` and `normalize_length`
//! are idempotent.

use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_OBJECTIVE: &str = "Quiero obtener un resultado claro y útil";
pub const DEFAULT_LENGTH: &str = "300 a 500 palabras";

/// Leading verbs that already read as an intention.
const OBJECTIVE_VERBS: &[&str] = &[
    "quiero",
    "necesito",
    "busco",
    "mejorar",
    "crear",
    "aprender",
    "hacer",
    "optimizar",
    "redactar",
    "investigar",
    "preparar",
    "explicar",
    "diseñar",
];

pub const ALLOWED_TONES: &[&str] = &[
    "profesional",
    "educativo",
    "técnico",
    "tecnico",
    "amigable",
    "formal",
    "informal",
    "motivador",
];

pub const ALLOWED_FORMATS: &[&str] = &[
    "lista",
    "lista de pasos",
    "pasos",
    "tabla",
    "tabla comparativa",
    "json",
    "markdown",
    "resumen",
    "texto corrido",
];

static BARE_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]{2,5})$").unwrap());
static WORD_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{2,5})\s*palabras$").unwrap());
static WORD_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9]{2,5})\s*(?:a|-|–|—)\s*([0-9]{2,5})(?:\s*palabras)?$").unwrap()
});

/// Rewrites an objective so it reads as "Quiero …" unless it already opens
/// with an intention verb, then capitalizes it.
pub fn normalize_objective(text: &str) -> String {
    let base = text.trim();
    if base.is_empty() {
        return DEFAULT_OBJECTIVE.to_string();
    }

    let lower = base.to_lowercase();
    let base = if OBJECTIVE_VERBS.iter().any(|v| lower.starts_with(v)) {
        base.to_string()
    } else {
        format!("Quiero {base}")
    };

    capitalize_first(&base)
}

/// Canonicalizes a length answer: `400` → `400 palabras`,
/// `300-500` → `300 a 500 palabras`. Unrecognized text is returned trimmed
/// and lower-cased.
pub fn normalize_length(text: &str) -> String {
    let s = text.trim().to_lowercase();
    if s.is_empty() {
        return DEFAULT_LENGTH.to_string();
    }

    if let Some(caps) = BARE_COUNT
        .captures(&s)
        .or_else(|| WORD_COUNT.captures(&s))
    {
        return format!("{} palabras", &caps[1]);
    }
    if let Some(caps) = WORD_RANGE.captures(&s) {
        return format!("{} a {} palabras", &caps[1], &caps[2]);
    }
    s
}

/// Cheap pre-filter for the length question.
pub fn looks_like_length(text: &str) -> bool {
    let s = text.trim().to_lowercase();
    if s.is_empty() {
        return false;
    }
    BARE_COUNT.is_match(&s)
        || WORD_COUNT.is_match(&s)
        || WORD_RANGE.is_match(&s)
        || s.contains("longitud")
}

pub fn is_allowed_tone(answer: &str) -> bool {
    in_vocabulary(ALLOWED_TONES, answer)
}

pub fn is_allowed_format(answer: &str) -> bool {
    in_vocabulary(ALLOWED_FORMATS, answer)
}

/// Vocabulary in byte order, as shown to users after a rejection.
pub fn sorted_vocabulary(words: &[&str]) -> Vec<String> {
    let mut sorted: Vec<String> = words.iter().map(|w| w.to_string()).collect();
    sorted.sort();
    sorted
}

fn in_vocabulary(words: &[&str], answer: &str) -> bool {
    let needle = answer.trim().to_lowercase();
    words.iter().any(|w| *w == needle)
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
