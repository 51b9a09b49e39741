use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Answers accumulated during one guided session, keyed by question id.
///
/// Supplied by the client on every call and never stored server-side.
/// Deserialization is lenient: scalar values are stringified, nulls and
/// nested values are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct AnswerHistory(BTreeMap<String, String>);

impl From<BTreeMap<String, Value>> for AnswerHistory {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let answers = raw
            .into_iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    Value::String(s) => s,
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Null | Value::Array(_) | Value::Object(_) => return None,
                };
                Some((key, text))
            })
            .collect();
        AnswerHistory(answers)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AnswerHistory {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        AnswerHistory(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl AnswerHistory {
    pub fn get(&self, question_id: &str) -> Option<&str> {
        self.0.get(question_id).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact JSON rendering used inside classifier messages.
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

/// Outcome of validating one answer. Business rejections are `ok = false`
/// with a hint, never a transport error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub hint: String,
    /// Canonical form of the answer, when the validator rewrites it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Sorted closed vocabulary offered after a rejection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

impl ValidationResult {
    pub fn accepted() -> Self {
        Self {
            ok: true,
            hint: "OK".to_string(),
            value: None,
            suggestions: None,
        }
    }

    pub fn rejected(hint: impl Into<String>) -> Self {
        Self {
            ok: false,
            hint: hint.into(),
            value: None,
            suggestions: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = Some(suggestions);
        self
    }
}
