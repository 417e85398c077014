//! Canonical match result and the schema variants it is rendered into

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output shape requested from the model and emitted to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResultSchema {
    /// `{score, analysis, recommendations}`
    Score,
    /// `{matchPercentage, synthesis, evaluationTable, interpretation, recommendations, strengths, gaps}`
    Rich,
    /// `{overall_match_percentage, criteria_scores, strengths, gaps, recommendation}`
    Structured,
}

impl ResultSchema {
    /// Upper bound of per-criterion sub-scores for this schema
    pub fn criterion_scale(&self) -> u32 {
        match self {
            ResultSchema::Structured => 100,
            ResultSchema::Score | ResultSchema::Rich => 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion: String,
    pub score: u32,
    pub reasons: String,
    pub comments: String,
}

/// Canonical result: the union of every observed response shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub match_percentage: u32,
    pub synthesis: String,
    pub evaluation_table: Vec<CriterionScore>,
    pub interpretation: String,
    pub recommendations: String,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
}

impl MatchResult {
    /// The all-zero, all-empty result emitted when evaluation cannot be performed.
    pub fn fallback() -> Self {
        Self::default()
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}

/// Score-only wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub score: u32,
    pub analysis: String,
    pub recommendations: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredCriterion {
    pub criterion: String,
    pub score: u32,
    pub explanation: String,
}

/// Structured-criteria wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredReport {
    pub overall_match_percentage: u32,
    pub criteria_scores: Vec<StructuredCriterion>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub recommendation: String,
}

/// A result rendered in one of the documented schemas.
///
/// Serialized untagged so each variant produces exactly its wire shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MatchReport {
    Score(ScoreReport),
    Rich(MatchResult),
    Structured(StructuredReport),
}

impl MatchReport {
    pub fn render(result: &MatchResult, schema: ResultSchema) -> Self {
        match schema {
            ResultSchema::Score => MatchReport::Score(ScoreReport {
                score: result.match_percentage,
                analysis: result.synthesis.clone(),
                recommendations: result.recommendations.clone(),
            }),
            ResultSchema::Rich => MatchReport::Rich(result.clone()),
            ResultSchema::Structured => MatchReport::Structured(StructuredReport {
                overall_match_percentage: result.match_percentage,
                criteria_scores: result
                    .evaluation_table
                    .iter()
                    .map(|row| StructuredCriterion {
                        criterion: row.criterion.clone(),
                        score: row.score,
                        explanation: row.reasons.clone(),
                    })
                    .collect(),
                strengths: result.strengths.clone(),
                gaps: result.gaps.clone(),
                recommendation: result.recommendations.clone(),
            }),
        }
    }

    pub fn schema(&self) -> ResultSchema {
        match self {
            MatchReport::Score(_) => ResultSchema::Score,
            MatchReport::Rich(_) => ResultSchema::Rich,
            MatchReport::Structured(_) => ResultSchema::Structured,
        }
    }
}

/// Routing decision for an application, derived from the overall match percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Triage {
    AutoSend,
    ManualReview,
    Reject,
}

impl Triage {
    pub fn classify(match_percentage: u32, auto_send_threshold: u32, manual_review_threshold: u32) -> Self {
        if match_percentage >= auto_send_threshold {
            Triage::AutoSend
        } else if match_percentage >= manual_review_threshold {
            Triage::ManualReview
        } else {
            Triage::Reject
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Triage::AutoSend => "auto-send",
            Triage::ManualReview => "manual review",
            Triage::Reject => "reject",
        }
    }
}
