//! Completion backends: the capability the match engine delegates scoring to

use crate::config::{BackendKind, EvaluatorConfig};
use crate::error::{MatcherError, Result};
use crate::llm::prompts::Prompt;
use async_trait::async_trait;
use log::info;

/// A chat-completion service that answers one prompt with raw JSON text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Single request/response round trip. An empty completion is returned as `"{}"`.
    async fn complete(&self, prompt: &Prompt) -> Result<String>;
}

/// Deterministic backend that always answers with the same text.
#[derive(Debug, Clone)]
pub struct StubBackend {
    response: String,
}

impl StubBackend {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new("{}")
    }
}

#[async_trait]
impl CompletionBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _prompt: &Prompt) -> Result<String> {
        if self.response.trim().is_empty() {
            Ok("{}".to_string())
        } else {
            Ok(self.response.clone())
        }
    }
}

/// Select and construct the backend for this invocation.
///
/// Backend availability is checked first, then the credential, before any call is made.
pub fn build_backend(
    kind: BackendKind,
    settings: &EvaluatorConfig,
    api_key: Option<String>,
    stub_response: Option<String>,
) -> Result<Box<dyn CompletionBackend>> {
    match kind {
        BackendKind::Stub => {
            info!("Using deterministic stub backend");
            Ok(Box::new(StubBackend::new(stub_response.unwrap_or_else(|| "{}".to_string()))))
        }
        BackendKind::OpenAi => openai_backend(settings, api_key),
    }
}

#[cfg(feature = "openai")]
fn openai_backend(settings: &EvaluatorConfig, api_key: Option<String>) -> Result<Box<dyn CompletionBackend>> {
    let api_key = api_key
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| MatcherError::Configuration(format!("{} environment variable not set", settings.api_key_env)))?;

    info!("Using OpenAI backend with model {}", settings.model);
    let backend = crate::llm::openai::OpenAiBackend::new(settings, api_key)?;
    Ok(Box::new(backend))
}

#[cfg(not(feature = "openai"))]
fn openai_backend(_settings: &EvaluatorConfig, _api_key: Option<String>) -> Result<Box<dyn CompletionBackend>> {
    Err(MatcherError::DependencyUnavailable(
        "OpenAI backend not compiled in; rebuild with the `openai` feature".to_string(),
    ))
}
