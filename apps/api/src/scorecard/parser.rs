//! Tolerant parsing of the judge's reply.
//!
//! Models wrap JSON in prose or code fences more often than not. The parser
//! tries, in order: the whole trimmed text, then the span from the first `{`
//! to the last `}`. Only a JSON *object* counts as success at either stage.
//! If both fail the raw text becomes the critique. Parsing never errors.

use serde_json::{Map, Value};

/// How much of an unparseable reply survives as critique.
pub const FALLBACK_CRITIQUE_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub enum JudgeOutput {
    /// The whole reply was a JSON object.
    Parsed(Map<String, Value>),
    /// A JSON object was recovered from inside the reply.
    Repaired(Map<String, Value>),
    /// No object could be recovered.
    Fallback { critique: String },
}

impl JudgeOutput {
    pub fn parse(raw: &str) -> Self {
        let text = raw.trim();

        if let Some(object) = parse_object(text) {
            return JudgeOutput::Parsed(object);
        }

        if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
            if start < end {
                if let Some(object) = parse_object(&text[start..=end]) {
                    return JudgeOutput::Repaired(object);
                }
            }
        }

        JudgeOutput::Fallback {
            critique: text.chars().take(FALLBACK_CRITIQUE_CHARS).collect(),
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            JudgeOutput::Parsed(_) => "parsed",
            JudgeOutput::Repaired(_) => "repaired",
            JudgeOutput::Fallback { .. } => "fallback",
        }
    }

    /// Uniform object view: the fallback becomes
    /// `{critique, criteria: {}, penalties: {}}`.
    pub fn into_object(self) -> Map<String, Value> {
        match self {
            JudgeOutput::Parsed(object) | JudgeOutput::Repaired(object) => object,
            JudgeOutput::Fallback { critique } => {
                let mut object = Map::new();
                object.insert("critique".to_string(), Value::String(critique));
                object.insert("criteria".to_string(), Value::Object(Map::new()));
                object.insert("penalties".to_string(), Value::Object(Map::new()));
                object
            }
        }
    }
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}
