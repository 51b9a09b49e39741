// Shared prompt fragments. Each feature that calls the gateway keeps its own
// prompts.rs alongside it; this file only holds cross-cutting pieces.

/// Closing line of every one-word classification message.
pub const ONE_WORD_ANSWER: &str = "Responde solo: coherente | incoherente";
