//! Improve Engine: LLM rewrite of a prompt with a hard word cap.
//!
//! The instruction asks for at most 150 words; the result is truncated
//! anyway, whatever the model returned.

use tracing::info;

use crate::improve::prompts::IMPROVER_SYSTEM;
use crate::llm_client::{GenerationRequest, LlmError, LlmGateway};

pub const MAX_WORDS: usize = 150;
const IMPROVER_TEMPERATURE: f32 = 0.2;
const IMPROVER_MAX_TOKENS: u32 = 512;

pub async fn improve_prompt(
    llm: &LlmGateway,
    prompt: &str,
    model: Option<String>,
) -> Result<String, LlmError> {
    let request = GenerationRequest::new(prompt)
        .with_system(IMPROVER_SYSTEM)
        .with_model(model)
        .with_temperature(IMPROVER_TEMPERATURE)
        .with_max_tokens(IMPROVER_MAX_TOKENS);

    let generation = llm.generate(request).await?;
    let improved = truncate_words(&generation.text, MAX_WORDS);
    info!(
        provider = %generation.provider,
        words = improved.split_whitespace().count(),
        "Prompt improved"
    );
    Ok(improved)
}

/// Keeps the first `max_words` whitespace-separated tokens, re-joined with
/// single spaces. Text within the limit is returned unchanged.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > max_words {
        words[..max_words].join(" ")
    } else {
        text.to_string()
    }
}
