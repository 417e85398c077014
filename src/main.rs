//! cv-matcher: score a CV against a job posting with a language model

use clap::Parser;
use cv_matcher::cli::{Cli, Commands, ConfigAction, EvalOptions, JobArgs, Resolved};
use cv_matcher::config::Config;
use cv_matcher::error::{MatcherError, Result};
use cv_matcher::input::InputManager;
use cv_matcher::llm::backend::build_backend;
use cv_matcher::llm::prompts::PromptBuilder;
use cv_matcher::output::{create_spinner, write_output, JsonFormatter, SummaryFormatter};
use cv_matcher::processing::analyzer::{resolve_outcome, MatchEngine};
use cv_matcher::processing::request::{parse_skills, JobFields, JobPosting, MatchRequest, TextLengths};
use cv_matcher::processing::result::{MatchReport, MatchResult, Triage};
use log::{debug, error, info, warn};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => debug!("Ignoring unreadable .env file: {}", e),
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, cli.config, config).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config_path: Option<PathBuf>, config: Config) -> Result<()> {
    let inputs = InputManager::new();

    match command {
        Commands::Evaluate { options } => {
            let request = match inputs.read_document(tokio::io::stdin()).await {
                Ok(document) => MatchRequest::from_json(&document),
                Err(e) => Err(e),
            };
            run_evaluation(request, &options, &config).await
        }

        Commands::Match { cv, job, options } => {
            let request = build_request(&inputs, &cv, job).await;
            run_evaluation(request, &options, &config).await
        }

        Commands::Count { compact } => {
            let lengths = match inputs.read_document(tokio::io::stdin()).await {
                Ok(document) => TextLengths::from_json(&document),
                Err(e) => {
                    warn!("Unreadable count input, reporting zero lengths: {}", e);
                    TextLengths::default()
                }
            };
            let content = JsonFormatter::new(config.output.pretty && !compact).format(&lengths)?;
            write_output(&content, None)
        }

        Commands::Config { action } => {
            let path = config_path.unwrap_or_else(Config::config_path);
            match action {
                Some(ConfigAction::Show) | None => write_output(config.to_toml()?.trim_end(), None),
                Some(ConfigAction::Path) => write_output(&path.display().to_string(), None),
                Some(ConfigAction::Reset) => {
                    Config::default().save(&path)?;
                    info!("Configuration reset to defaults at {}", path.display());
                    Ok(())
                }
            }
        }
    }
}

async fn build_request(inputs: &InputManager, cv: &str, job: JobArgs) -> Result<MatchRequest> {
    let cv_text = inputs.resolve_source(cv).await?;

    let posting = match job {
        JobArgs { job: Some(job), .. } => JobPosting::Text(inputs.resolve_source(&job).await?),
        JobArgs {
            job_title: Some(title),
            job_description: Some(description),
            job_requirements,
            job_skills,
            experience,
            ..
        } => JobPosting::Fields(JobFields {
            title,
            description,
            requirements: job_requirements.unwrap_or_default(),
            skills: job_skills.as_deref().map(parse_skills).unwrap_or_default(),
            experience_years_required: experience.unwrap_or(0),
        }),
        _ => {
            return Err(MatcherError::InvalidInput(
                "Provide --job, or --job-title together with --job-description".to_string(),
            ))
        }
    };

    Ok(MatchRequest::new(cv_text, posting))
}

async fn run_evaluation(request: Result<MatchRequest>, options: &EvalOptions, config: &Config) -> Result<()> {
    let settings = options.resolve(config);

    let outcome = match request {
        Ok(request) => evaluate(&request, settings, options, config).await,
        Err(e) => Err(e),
    };
    let result = resolve_outcome(settings.mode, outcome)?;

    let report = MatchReport::render(&result, settings.schema);
    let content = JsonFormatter::new(settings.pretty).format(&report)?;
    write_output(&content, options.output.as_deref())?;

    if !result.is_fallback() {
        let summary = SummaryFormatter::new(config.output.color);
        let triage = Triage::classify(
            result.match_percentage,
            config.triage.auto_send_threshold,
            config.triage.manual_review_threshold,
        );
        eprintln!("{}", summary.summary_line(&result, triage));
        if let Some(path) = &options.output {
            eprintln!("{}", summary.saved_line(path));
        }
    }

    Ok(())
}

async fn evaluate(
    request: &MatchRequest,
    settings: Resolved,
    options: &EvalOptions,
    config: &Config,
) -> Result<MatchResult> {
    let api_key = std::env::var(&config.evaluator.api_key_env).ok();
    let backend = build_backend(
        settings.backend,
        &config.evaluator,
        api_key,
        options.stub_response.clone(),
    )?;

    let engine = MatchEngine::new(backend, PromptBuilder::new(config.evaluator.max_input_chars));

    let spinner = create_spinner("Evaluating CV against job posting...", std::io::stderr().is_terminal());
    let outcome = engine.evaluate(request, settings.schema).await;
    spinner.finish_and_clear();

    outcome
}
