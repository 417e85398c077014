//! Configuration management for the CV matcher

use crate::error::{MatcherError, Result};
use crate::processing::result::ResultSchema;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Model identifier pinned for the hosted backend.
pub const DEFAULT_MODEL: &str = "gpt-4o-2024-08-06";
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Character budget applied to the CV and job text before prompting.
pub const MAX_INPUT_CHARS: usize = 20_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub evaluator: EvaluatorConfig,
    pub output: OutputConfig,
    pub triage: TriageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    pub backend: BackendKind,
    pub model: String,
    pub api_base_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f64,
    pub timeout_secs: u64,
    pub max_input_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub schema: ResultSchema,
    pub mode: Mode,
    pub pretty: bool,
    pub color: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub auto_send_threshold: u32,
    pub manual_review_threshold: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[value(name = "openai")]
    OpenAi,
    Stub,
}

/// How errors are surfaced to the caller for a whole invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Propagate to the process boundary with a non-zero exit
    Strict,
    /// Emit the fallback result and exit successfully
    Defensive,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::OpenAi,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            temperature: 0.3,
            timeout_secs: 60,
            max_input_chars: MAX_INPUT_CHARS,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            schema: ResultSchema::Rich,
            mode: Mode::Strict,
            pretty: true,
            color: true,
        }
    }
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            auto_send_threshold: 80,
            manual_review_threshold: 60,
        }
    }
}

impl Config {
    /// Load from an explicit path, or from the user config dir when `path` is `None`.
    ///
    /// A missing file at the default location yields the built-in defaults; a
    /// missing explicit path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(MatcherError::Configuration(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::read_from(path)?
            }
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::read_from(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.validate()?;
        Ok(config)
    }

    fn read_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| MatcherError::Configuration(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| MatcherError::Configuration(format!("Failed to serialize config: {}", e)))
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("cv-matcher")
            .join("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        let evaluator = &self.evaluator;
        if !(0.0..=2.0).contains(&evaluator.temperature) {
            return Err(MatcherError::Configuration(format!(
                "evaluator.temperature must be within 0.0..=2.0, got {}",
                evaluator.temperature
            )));
        }
        if evaluator.timeout_secs == 0 {
            return Err(MatcherError::Configuration(
                "evaluator.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if evaluator.max_input_chars == 0 {
            return Err(MatcherError::Configuration(
                "evaluator.max_input_chars must be greater than zero".to_string(),
            ));
        }
        if evaluator.model.trim().is_empty() {
            return Err(MatcherError::Configuration(
                "evaluator.model must not be empty".to_string(),
            ));
        }

        let triage = &self.triage;
        if triage.auto_send_threshold > 100 || triage.manual_review_threshold > triage.auto_send_threshold {
            return Err(MatcherError::Configuration(format!(
                "triage thresholds must satisfy manual_review ({}) <= auto_send ({}) <= 100",
                triage.manual_review_threshold, triage.auto_send_threshold
            )));
        }

        Ok(())
    }
}
