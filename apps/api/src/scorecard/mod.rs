// Scorecard: strict rubric judging of a composed prompt.
// All LLM calls go through llm_client::LlmGateway.

pub mod engine;
pub mod front;
pub mod handlers;
pub mod parser;
pub mod prompts;
