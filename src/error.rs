//! Error handling for the CV matcher

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Response parse error: {0}")]
    ResponseParse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MatcherError>;

impl MatcherError {
    /// Short machine-friendly name of the error kind, used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            MatcherError::Io(_) => "io",
            MatcherError::Configuration(_) => "configuration",
            MatcherError::DependencyUnavailable(_) => "dependency_unavailable",
            MatcherError::ExternalService(_) => "external_service",
            MatcherError::ResponseParse(_) => "response_parse",
            MatcherError::InvalidInput(_) => "invalid_input",
            MatcherError::PdfExtraction(_) => "pdf_extraction",
            MatcherError::UnsupportedFormat(_) => "unsupported_format",
            MatcherError::Serialization(_) => "serialization",
        }
    }
}

/// Transport failures, timeouts and bad statuses all surface as external service errors
#[cfg(feature = "openai")]
impl From<reqwest::Error> for MatcherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MatcherError::ExternalService(format!("request timed out: {}", err))
        } else if let Some(status) = err.status() {
            MatcherError::ExternalService(format!("service returned {}: {}", status, err))
        } else {
            MatcherError::ExternalService(err.to_string())
        }
    }
}
