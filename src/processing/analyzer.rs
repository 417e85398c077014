//! Match engine: prompt assembly, one completion call, normalization

use crate::config::Mode;
use crate::error::Result;
use crate::llm::backend::CompletionBackend;
use crate::llm::prompts::PromptBuilder;
use crate::processing::normalizer::normalize;
use crate::processing::request::MatchRequest;
use crate::processing::result::{MatchResult, ResultSchema};
use log::{debug, info, warn};
use std::time::Instant;

pub struct MatchEngine {
    backend: Box<dyn CompletionBackend>,
    prompts: PromptBuilder,
}

impl MatchEngine {
    pub fn new(backend: Box<dyn CompletionBackend>, prompts: PromptBuilder) -> Self {
        Self { backend, prompts }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Evaluate one request. Backend and parse errors are returned as-is.
    pub async fn evaluate(&self, request: &MatchRequest, schema: ResultSchema) -> Result<MatchResult> {
        let start_time = Instant::now();

        let prompt = self.prompts.build(request, schema);
        info!("Requesting {:?} evaluation from {} backend", schema, self.backend.name());

        let raw = self.backend.complete(&prompt).await?;
        debug!("Raw completion ({} chars): {}", raw.len(), raw);

        let normalized = normalize(&raw, schema)?;
        if !normalized.issues.is_empty() {
            info!("{} response field(s) defaulted during normalization", normalized.issues.len());
        }

        info!(
            "Evaluation finished in {}ms: {}%",
            start_time.elapsed().as_millis(),
            normalized.result.match_percentage
        );
        Ok(normalized.result)
    }
}

/// Apply the invocation's error policy to an evaluation outcome.
///
/// Defensive mode replaces any error with the fallback result; strict mode
/// passes the error through to the process boundary.
pub fn resolve_outcome(mode: Mode, outcome: Result<MatchResult>) -> Result<MatchResult> {
    match (mode, outcome) {
        (_, Ok(result)) => Ok(result),
        (Mode::Strict, Err(e)) => Err(e),
        (Mode::Defensive, Err(e)) => {
            warn!("Evaluation failed ({}), emitting fallback result: {}", e.kind(), e);
            Ok(MatchResult::fallback())
        }
    }
}
