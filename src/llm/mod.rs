//! LLM integration module

pub mod backend;
#[cfg(feature = "openai")]
pub mod openai;
pub mod prompts;
