// Improve: bounded LLM rewrite of a prompt.

pub mod engine;
pub mod handlers;
pub mod prompts;
