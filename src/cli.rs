//! CLI interface for the CV matcher

use crate::config::{BackendKind, Config, Mode};
use crate::processing::result::ResultSchema;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cv-matcher")]
#[command(version, about = "Score how well a CV matches a job posting")]
#[command(long_about = "Ask a language model to compare a CV against a job posting and emit a normalized JSON match report")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Evaluate a JSON match document read from stdin
    Evaluate {
        #[command(flatten)]
        options: EvalOptions,
    },

    /// Evaluate a CV against a job given as arguments or files
    Match {
        /// CV file (PDF, TXT, MD) or literal CV text
        #[arg(long)]
        cv: String,

        #[command(flatten)]
        job: JobArgs,

        #[command(flatten)]
        options: EvalOptions,
    },

    /// Report character counts of cvText and jobText read from stdin
    Count {
        /// Emit compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Show or reset configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct JobArgs {
    /// Job posting file or literal text
    #[arg(long, conflicts_with_all = ["job_title", "job_description", "job_requirements", "job_skills", "experience"])]
    pub job: Option<String>,

    /// Job title
    #[arg(long, requires = "job_description")]
    pub job_title: Option<String>,

    /// Job description
    #[arg(long, requires = "job_title")]
    pub job_description: Option<String>,

    /// Job requirements
    #[arg(long)]
    pub job_requirements: Option<String>,

    /// Comma-separated required skills
    #[arg(long)]
    pub job_skills: Option<String>,

    /// Years of experience required
    #[arg(long)]
    pub experience: Option<u32>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct EvalOptions {
    /// Output schema [default: from config, rich]
    #[arg(long, value_enum)]
    pub schema: Option<ResultSchema>,

    /// Error policy [default: from config, strict]
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// Evaluator backend [default: from config, openai]
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,

    /// Canned response for the stub backend
    #[arg(long)]
    pub stub_response: Option<String>,

    /// Write the JSON result to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Emit compact JSON
    #[arg(long)]
    pub compact: bool,
}

/// Settings for one evaluation after applying CLI flags over the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub schema: ResultSchema,
    pub mode: Mode,
    pub backend: BackendKind,
    pub pretty: bool,
}

impl EvalOptions {
    pub fn resolve(&self, config: &Config) -> Resolved {
        Resolved {
            schema: self.schema.unwrap_or(config.output.schema),
            mode: self.mode.unwrap_or(config.output.mode),
            backend: self.backend.unwrap_or(config.evaluator.backend),
            pretty: config.output.pretty && !self.compact,
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Reset configuration to defaults
    Reset,
}
