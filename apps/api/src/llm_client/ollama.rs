//! Ollama backend: local models over `POST {host}/api/generate`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationRequest, LlmBackend, LlmError};

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: Option<String>,
}

#[derive(Clone)]
pub struct OllamaBackend {
    client: Client,
    host: String,
    default_model: String,
    enabled: bool,
}

impl OllamaBackend {
    pub fn new(
        host: impl Into<String>,
        default_model: impl Into<String>,
        enabled: bool,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            host: host.into().trim_end_matches('/').to_string(),
            default_model: default_model.into(),
            enabled,
        })
    }

    /// Gemini model names are meant for the other backend.
    fn resolve_model<'a>(&'a self, hint: Option<&'a str>) -> &'a str {
        hint.filter(|m| !m.starts_with("gemini"))
            .unwrap_or(&self.default_model)
    }
}

/// `generate` has no system slot, so the instruction goes first.
fn build_prompt(system: Option<&str>, prompt: &str) -> String {
    match system {
        Some(system) if !system.trim().is_empty() => format!("{system}\n\n{prompt}"),
        _ => prompt.to_string(),
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn is_available(&self, _request: &GenerationRequest) -> bool {
        self.enabled
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        let model = self.resolve_model(request.model.as_deref());
        let prompt = build_prompt(request.system.as_deref(), &request.prompt);

        let body = OllamaRequest {
            model,
            prompt: &prompt,
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.host))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: OllamaResponse = response.json().await?;
        let text = parsed.response.unwrap_or_default().trim().to_string();
        debug!(model, chars = text.len(), "ollama generation finished");
        Ok(text)
    }
}
