//! Output formatting: the JSON document on stdout and the human summary on stderr

use crate::error::Result;
use crate::processing::result::{MatchResult, Triage};
use colored::{Color, Colorize};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

/// Serializes the single machine-readable document an invocation produces.
#[derive(Debug, Clone, Copy)]
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }
}

/// Write the document to `path`, or to stdout when no path is given.
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(file_path) => {
            if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(file_path, format!("{}\n", content))?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
            handle.flush()?;
        }
    }
    Ok(())
}

/// One-line human summary printed to stderr after an evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SummaryFormatter {
    use_colors: bool,
}

impl SummaryFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn summary_line(&self, result: &MatchResult, triage: Triage) -> String {
        let color = match triage {
            Triage::AutoSend => Color::Green,
            Triage::ManualReview => Color::Yellow,
            Triage::Reject => Color::Red,
        };

        let score = format!("{}%", result.match_percentage);
        format!(
            "{} Match Score: {} ({})",
            self.colorize("✓", Color::Green),
            self.colorize(&score, color),
            triage.label()
        )
    }

    pub fn saved_line(&self, path: &Path) -> String {
        format!("Results saved to {}", self.colorize(&path.display().to_string(), Color::Cyan))
    }
}

/// Spinner on stderr while the evaluator is working. Hidden when `enabled` is false.
pub fn create_spinner(message: &str, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
