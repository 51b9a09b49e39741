//! The guided flow: six fixed questions, per-step validation and prompt
//! composition. Nothing here is persisted; the client carries the answers.

pub mod composer;
pub mod handlers;
pub mod models;
pub mod normalize;
pub mod prompts;
pub mod questions;
pub mod validator;
