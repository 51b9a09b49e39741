//! LLM Gateway: the single point of entry for all model calls in the guide API.
//!
//! ARCHITECTURAL RULE: No other module may talk to Ollama or Gemini directly.
//! Validation, scoring and improving all go through `LlmGateway`.
//!
//! Backends are injected at construction and tried in order; the first one
//! that answers with non-empty text wins.
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub mod gemini;
#[cfg(test)]
pub mod mock;
pub mod ollama;
pub mod prompts;

pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
/// One-word verdicts never need more than a handful of tokens.
const CLASSIFIER_MAX_TOKENS: u32 = 8;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No LLM provider available: configure GEMINI_API_KEY or enable Ollama.")]
    NoProvider,

    #[error("All LLM providers failed (last: {provider}): {source}")]
    Exhausted {
        provider: &'static str,
        source: Box<LlmError>,
    },
}

impl LlmError {
    /// True when the failure means "no model could be reached", as opposed to
    /// a model that answered with something unusable or refused the request.
    ///
    /// `Exhausted` is judged by the last backend's failure.
    pub fn is_unavailable(&self) -> bool {
        match self {
            LlmError::NoProvider => true,
            LlmError::Exhausted { source, .. } => source.is_transient(),
            _ => false,
        }
    }

    /// Transport errors, timeouts, 429 and 5xx.
    fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::RateLimited { .. } => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// A single generation call. Built with `GenerationRequest::new` and the
/// `with_*` setters; unset fields fall back to the gateway defaults.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system: Option<String>,
    /// Model hint. Each backend decides whether the name is one of its models.
    pub model: Option<String>,
    /// Per-request API key (Gemini only).
    pub credential: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider not to block on its harm filters (Gemini only).
    pub relaxed_safety: bool,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system: None,
            model: None,
            credential: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            relaxed_safety: false,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model.filter(|m| !m.trim().is_empty());
        self
    }

    pub fn with_credential(mut self, credential: Option<String>) -> Self {
        self.credential = credential.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_relaxed_safety(mut self) -> Self {
        self.relaxed_safety = true;
        self
    }
}

/// Text produced by one backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Generation {
    pub provider: String,
    pub text: String,
}

/// A concrete model provider. Implement this to add a backend without
/// touching the validator, scorecard or improve code.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this backend can serve the request at all (configured, has a key).
    fn is_available(&self, request: &GenerationRequest) -> bool;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError>;
}

/// Verdict of the one-word coherence classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    #[serde(rename = "coherente")]
    Coherent,
    #[serde(rename = "incoherente")]
    Incoherent,
    /// The model said something else. Callers treat this as "not coherent".
    #[serde(rename = "")]
    Unclear,
}

const VERDICT_NOISE: &[char] = &['.', ':', ';', ',', '¡', '!', '¿', '?', '"', '\''];

impl Verdict {
    /// Normalizes raw model output into a verdict. Only the prefixes `coher`
    /// and `incoher` are accepted.
    pub fn from_raw(raw: &str) -> Self {
        let cleaned: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| !VERDICT_NOISE.contains(c))
            .collect();
        let cleaned = cleaned.trim();

        if cleaned.starts_with("incoher") {
            Verdict::Incoherent
        } else if cleaned.starts_with("coher") {
            Verdict::Coherent
        } else {
            Verdict::Unclear
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Coherent => "coherente",
            Verdict::Incoherent => "incoherente",
            Verdict::Unclear => "",
        }
    }
}

/// Ordered set of backends with fallback. Cheap to clone.
#[derive(Clone, Default)]
pub struct LlmGateway {
    backends: Vec<Arc<dyn LlmBackend>>,
    classifier_model: Option<String>,
}

impl LlmGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a backend. Order of calls is order of fallback.
    pub fn with_backend(mut self, backend: Arc<dyn LlmBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Model hint used by `classify_one_word`.
    pub fn with_classifier_model(mut self, model: impl Into<String>) -> Self {
        self.classifier_model = Some(model.into());
        self
    }

    /// Names of backends usable without a per-request credential.
    pub fn available_providers(&self) -> Vec<&'static str> {
        let probe = GenerationRequest::new("");
        self.backends
            .iter()
            .filter(|b| b.is_available(&probe))
            .map(|b| b.name())
            .collect()
    }

    /// Generates text with the first backend that answers.
    ///
    /// An empty prompt returns `provider = "none"` without calling anything.
    /// Fails with `NoProvider` when no backend can serve the request, with
    /// `EmptyContent` when a backend answered but only with blank text, and
    /// with `Exhausted` when every candidate failed outright.
    pub async fn generate(&self, mut request: GenerationRequest) -> Result<Generation, LlmError> {
        request.prompt = request.prompt.trim().to_string();
        if request.prompt.is_empty() {
            return Ok(Generation {
                provider: "none".to_string(),
                text: String::new(),
            });
        }

        let mut last_error: Option<(&'static str, LlmError)> = None;
        let mut answered_blank = false;

        for backend in self.backends.iter().filter(|b| b.is_available(&request)) {
            match backend.generate(&request).await {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(provider = backend.name(), "LLM generation succeeded");
                    return Ok(Generation {
                        provider: backend.name().to_string(),
                        text: text.trim().to_string(),
                    });
                }
                Ok(_) => {
                    warn!(
                        provider = backend.name(),
                        "LLM backend returned empty text, falling through"
                    );
                    answered_blank = true;
                }
                Err(e) => {
                    warn!(provider = backend.name(), "LLM backend failed, falling through: {e}");
                    last_error = Some((backend.name(), e));
                }
            }
        }

        if answered_blank {
            return Err(LlmError::EmptyContent);
        }
        match last_error {
            None => Err(LlmError::NoProvider),
            Some((provider, source)) => Err(LlmError::Exhausted {
                provider,
                source: Box::new(source),
            }),
        }
    }

    /// Asks for a single `coherente` / `incoherente` word and normalizes it.
    ///
    /// A blank reply is `Unclear`, like any other unparseable answer. Other
    /// errors are returned so the caller can pick its own policy.
    pub async fn classify_one_word(&self, system: &str, user: &str) -> Result<Verdict, LlmError> {
        let request = GenerationRequest::new(user)
            .with_system(system)
            .with_model(self.classifier_model.clone())
            .with_max_tokens(CLASSIFIER_MAX_TOKENS)
            .with_relaxed_safety();

        let generation = match self.generate(request).await {
            Ok(generation) => generation,
            Err(LlmError::EmptyContent) => {
                debug!("classifier answered with blank text");
                return Ok(Verdict::Unclear);
            }
            Err(e) => return Err(e),
        };
        let verdict = Verdict::from_raw(&generation.text);
        debug!(
            provider = %generation.provider,
            verdict = verdict.as_str(),
            "classifier verdict"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockBackend;
    use super::*;

    #[test]
    fn test_verdict_plain_words() {
        assert_eq!(Verdict::from_raw("coherente"), Verdict::Coherent);
        assert_eq!(Verdict::from_raw("incoherente"), Verdict::Incoherent);
    }

    #[test]
    fn test_verdict_strips_case_and_punctuation() {
        assert_eq!(Verdict::from_raw("  Coherente.\n"), Verdict::Coherent);
        assert_eq!(Verdict::from_raw("¡INCOHERENTE!"), Verdict::Incoherent);
        assert_eq!(Verdict::from_raw("\"coherente\""), Verdict::Coherent);
    }

    #[test]
    fn test_verdict_accepts_prefix_only() {
        assert_eq!(Verdict::from_raw("coherentes"), Verdict::Coherent);
        assert_eq!(Verdict::from_raw("incoherent"), Verdict::Incoherent);
    }

    #[test]
    fn test_verdict_anything_else_is_unclear() {
        assert_eq!(Verdict::from_raw(""), Verdict::Unclear);
        assert_eq!(Verdict::from_raw("Sí, es coherente"), Verdict::Unclear);
        assert_eq!(Verdict::from_raw("yes"), Verdict::Unclear);
        assert_eq!(Verdict::Unclear.as_str(), "");
    }

    #[test]
    fn test_verdict_serializes_as_spanish_word() {
        assert_eq!(
            serde_json::to_string(&Verdict::Coherent).unwrap(),
            "\"coherente\""
        );
        assert_eq!(serde_json::to_string(&Verdict::Unclear).unwrap(), "\"\"");
    }

    #[tokio::test]
    async fn test_empty_prompt_short_circuits() {
        let backend = MockBackend::new("ollama");
        let gateway = LlmGateway::new().with_backend(Arc::new(backend.clone()));

        let out = gateway.generate(GenerationRequest::new("   ")).await.unwrap();
        assert_eq!(out.provider, "none");
        assert_eq!(out.text, "");
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_backends_is_no_provider() {
        let gateway = LlmGateway::new();
        let err = gateway
            .generate(GenerationRequest::new("hola"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::NoProvider));
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_unavailable_backends_are_skipped() {
        let backend = MockBackend::new("gemini").unavailable();
        let gateway = LlmGateway::new().with_backend(Arc::new(backend.clone()));

        let err = gateway
            .generate(GenerationRequest::new("hola"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::NoProvider));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_first_backend_wins() {
        let first = MockBackend::new("ollama").with_response("primero");
        let second = MockBackend::new("gemini");
        let gateway = LlmGateway::new()
            .with_backend(Arc::new(first.clone()))
            .with_backend(Arc::new(second.clone()));

        let out = gateway.generate(GenerationRequest::new("hola")).await.unwrap();
        assert_eq!(out.provider, "ollama");
        assert_eq!(out.text, "primero");
        assert_eq!(second.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_falls_through_to_second_backend() {
        let first = MockBackend::new("ollama").with_failure("connection refused");
        let second = MockBackend::new("gemini").with_response("  segundo  ");
        let gateway = LlmGateway::new()
            .with_backend(Arc::new(first.clone()))
            .with_backend(Arc::new(second.clone()));

        let out = gateway.generate(GenerationRequest::new("hola")).await.unwrap();
        assert_eq!(out.provider, "gemini");
        assert_eq!(out.text, "segundo");
        assert_eq!(first.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_falls_through() {
        let first = MockBackend::new("ollama").with_response("   ");
        let second = MockBackend::new("gemini").with_response("ok");
        let gateway = LlmGateway::new()
            .with_backend(Arc::new(first))
            .with_backend(Arc::new(second));

        let out = gateway.generate(GenerationRequest::new("hola")).await.unwrap();
        assert_eq!(out.provider, "gemini");
    }

    #[tokio::test]
    async fn test_blank_answers_only_is_empty_content() {
        let first = MockBackend::new("ollama").with_failure("connection refused");
        let second = MockBackend::new("gemini").with_response("  ");
        let gateway = LlmGateway::new()
            .with_backend(Arc::new(first))
            .with_backend(Arc::new(second));

        let err = gateway
            .generate(GenerationRequest::new("hola"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn test_client_error_is_not_unavailability() {
        let backend = MockBackend::new("gemini").with_api_error(400, "API key not valid");
        let gateway = LlmGateway::new().with_backend(Arc::new(backend));

        let err = gateway
            .generate(GenerationRequest::new("hola"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Exhausted { .. }));
        assert!(!err.is_unavailable());
    }

    #[tokio::test]
    async fn test_rate_limit_is_unavailability() {
        let backend = MockBackend::new("gemini").with_api_error(429, "quota");
        let gateway = LlmGateway::new().with_backend(Arc::new(backend));

        let err = gateway
            .generate(GenerationRequest::new("hola"))
            .await
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_blank_classifier_reply_is_unclear() {
        let backend = MockBackend::new("gemini").with_response("");
        let gateway = LlmGateway::new().with_backend(Arc::new(backend.clone()));

        let verdict = gateway.classify_one_word("sys", "user").await.unwrap();
        assert_eq!(verdict, Verdict::Unclear);
        assert!(backend.calls()[0].relaxed_safety);
    }

    #[tokio::test]
    async fn test_all_failed_is_exhausted() {
        let first = MockBackend::new("ollama").with_failure("down");
        let second = MockBackend::new("gemini").with_failure("quota");
        let gateway = LlmGateway::new()
            .with_backend(Arc::new(first))
            .with_backend(Arc::new(second));

        let err = gateway
            .generate(GenerationRequest::new("hola"))
            .await
            .unwrap_err();
        match &err {
            LlmError::Exhausted { provider, .. } => assert_eq!(*provider, "gemini"),
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert!(err.is_unavailable());
    }

    #[tokio::test]
    async fn test_prompt_is_trimmed_before_dispatch() {
        let backend = MockBackend::new("ollama").with_response("ok");
        let gateway = LlmGateway::new().with_backend(Arc::new(backend.clone()));

        gateway
            .generate(GenerationRequest::new("  hola  ").with_system("sys"))
            .await
            .unwrap();
        let calls = backend.calls();
        assert_eq!(calls[0].prompt, "hola");
        assert_eq!(calls[0].system.as_deref(), Some("sys"));
    }

    #[tokio::test]
    async fn test_classifier_uses_short_budget_and_model_hint() {
        let backend = MockBackend::new("gemini").with_response("Coherente.");
        let gateway = LlmGateway::new()
            .with_backend(Arc::new(backend.clone()))
            .with_classifier_model("gemini-1.5-flash");

        let verdict = gateway.classify_one_word("sys", "user").await.unwrap();
        assert_eq!(verdict, Verdict::Coherent);

        let calls = backend.calls();
        assert_eq!(calls[0].max_tokens, CLASSIFIER_MAX_TOKENS);
        assert_eq!(calls[0].model.as_deref(), Some("gemini-1.5-flash"));
        assert!((calls[0].temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_available_providers_lists_configured_only() {
        let gateway = LlmGateway::new()
            .with_backend(Arc::new(MockBackend::new("ollama").unavailable()))
            .with_backend(Arc::new(MockBackend::new("gemini")));
        assert_eq!(gateway.available_providers(), vec!["gemini"]);
    }

    #[test]
    fn test_request_setters_drop_blank_values() {
        let req = GenerationRequest::new("p")
            .with_model(Some("  ".to_string()))
            .with_credential(Some(String::new()));
        assert!(req.model.is_none());
        assert!(req.credential.is_none());
    }
}
