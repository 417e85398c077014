//! Turns raw model output into a canonical, bounds-checked `MatchResult`.
//!
//! Everything here is a pure transform over text: no network, no credentials.
//! Invalid JSON is an error; everything else is recovered by defaulting and
//! recorded as a `MalformedField`.

use crate::error::{MatcherError, Result};
use crate::processing::result::{CriterionScore, MatchResult, ResultSchema};
use crate::processing::scoring::{clamp_score, PERCENT_SCALE};
use crate::processing::text_processor::strip_json_fences;
use log::warn;
use serde_json::{Map, Value};
use std::fmt;

const PERCENTAGE_KEYS: &[&str] = &["matchPercentage", "overall_match_percentage", "match_percentage", "score"];
const SYNTHESIS_KEYS: &[&str] = &["synthesis", "analysis", "summary"];
const TABLE_KEYS: &[&str] = &["evaluationTable", "criteria_scores"];
const RECOMMENDATION_KEYS: &[&str] = &["recommendations", "recommendation"];
const INTERPRETATION_KEYS: &[&str] = &["interpretation"];
const CRITERION_NAME_KEYS: &[&str] = &["criterion", "name"];
const REASONS_KEYS: &[&str] = &["reasons", "explanation"];
const COMMENTS_KEYS: &[&str] = &["comments"];

/// A field that was present but unusable, and was defaulted or dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedField {
    pub field: String,
    pub reason: String,
}

impl MalformedField {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for MalformedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub result: MatchResult,
    pub issues: Vec<MalformedField>,
}

/// Parse raw completion text and coerce it into the canonical result.
pub fn normalize(raw: &str, schema: ResultSchema) -> Result<Normalized> {
    let body = strip_json_fences(raw);
    let body = if body.is_empty() { "{}" } else { body };

    let parsed: Value = serde_json::from_str(body)
        .map_err(|e| MatcherError::ResponseParse(format!("model output is not valid JSON: {}", e)))?;

    let object = match parsed {
        Value::Object(object) => object,
        other => {
            return Err(MatcherError::ResponseParse(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            )))
        }
    };

    let mut reader = FieldReader::new(&object);
    let result = MatchResult {
        match_percentage: reader.score(PERCENTAGE_KEYS, PERCENT_SCALE),
        synthesis: reader.string(SYNTHESIS_KEYS),
        evaluation_table: reader.table(TABLE_KEYS, schema.criterion_scale()),
        interpretation: reader.string(INTERPRETATION_KEYS),
        recommendations: reader.string(RECOMMENDATION_KEYS),
        strengths: reader.string_list("strengths"),
        gaps: reader.string_list("gaps"),
    };

    for issue in &reader.issues {
        warn!("Defaulted malformed response field {}", issue);
    }

    Ok(Normalized {
        result,
        issues: reader.issues,
    })
}

struct FieldReader<'a> {
    object: &'a Map<String, Value>,
    issues: Vec<MalformedField>,
}

impl<'a> FieldReader<'a> {
    fn new(object: &'a Map<String, Value>) -> Self {
        Self {
            object,
            issues: Vec::new(),
        }
    }

    fn score(&mut self, keys: &[&str], max: u32) -> u32 {
        match lookup(self.object, keys) {
            Some((key, value)) => {
                if !is_numeric(value) {
                    self.issues.push(MalformedField::new(key, "score is not numeric, using 0"));
                }
                clamp_score(value, max)
            }
            None => 0,
        }
    }

    fn string(&self, keys: &[&str]) -> String {
        lookup(self.object, keys)
            .map(|(_, value)| coerce_string(value))
            .unwrap_or_default()
    }

    fn string_list(&mut self, key: &str) -> Vec<String> {
        let Some(value) = self.object.get(key) else {
            return Vec::new();
        };

        match value {
            Value::Array(items) => {
                let kept: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect();
                if kept.len() != items.len() {
                    self.issues.push(MalformedField::new(
                        key,
                        format!("dropped {} non-string element(s)", items.len() - kept.len()),
                    ));
                }
                kept
            }
            Value::Null => Vec::new(),
            other => {
                self.issues.push(MalformedField::new(
                    key,
                    format!("expected an array, got {}", json_type_name(other)),
                ));
                Vec::new()
            }
        }
    }

    fn table(&mut self, keys: &[&str], scale: u32) -> Vec<CriterionScore> {
        let Some((key, value)) = lookup(self.object, keys) else {
            return Vec::new();
        };

        let rows = match value {
            Value::Array(rows) => rows,
            Value::Null => return Vec::new(),
            other => {
                self.issues.push(MalformedField::new(
                    key,
                    format!("expected an array, got {}", json_type_name(other)),
                ));
                return Vec::new();
            }
        };

        let mut table = Vec::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            match criterion_row(row, scale) {
                Some(criterion) => table.push(criterion),
                None => self.issues.push(MalformedField::new(
                    format!("{}[{}]", key, index),
                    "dropped element without criterion name and score",
                )),
            }
        }
        table
    }
}

fn criterion_row(row: &Value, scale: u32) -> Option<CriterionScore> {
    let object = row.as_object()?;
    let (_, name) = lookup(object, CRITERION_NAME_KEYS)?;
    let criterion = name.as_str()?.trim();
    if criterion.is_empty() {
        return None;
    }
    let score = object.get("score")?;

    Some(CriterionScore {
        criterion: criterion.to_string(),
        score: clamp_score(score, scale),
        reasons: lookup(object, REASONS_KEYS)
            .map(|(_, v)| coerce_string(v))
            .unwrap_or_default(),
        comments: lookup(object, COMMENTS_KEYS)
            .map(|(_, v)| coerce_string(v))
            .unwrap_or_default(),
    })
}

/// First key from `keys` present with a non-null value.
fn lookup<'v>(object: &'v Map<String, Value>, keys: &[&'v str]) -> Option<(&'v str, &'v Value)> {
    keys.iter()
        .find_map(|key| object.get(*key).filter(|v| !v.is_null()).map(|v| (*key, v)))
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) | Value::Bool(_) => true,
        Value::String(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    }
}

/// Stringify any JSON value; never fails.
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) if items.iter().all(Value::is_string) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize_ok(raw: &str, schema: ResultSchema) -> Normalized {
        normalize(raw, schema).expect("normalization should succeed")
    }

    #[test]
    fn test_empty_object_yields_defaults() {
        let normalized = normalize_ok("{}", ResultSchema::Rich);
        assert!(normalized.result.is_fallback());
        assert!(normalized.issues.is_empty());
    }

    #[test]
    fn test_empty_string_is_treated_as_empty_object() {
        assert!(normalize_ok("", ResultSchema::Rich).result.is_fallback());
        assert!(normalize_ok("   ", ResultSchema::Score).result.is_fallback());
    }

    #[test]
    fn test_non_json_is_parse_error() {
        match normalize("not json", ResultSchema::Rich) {
            Err(MatcherError::ResponseParse(_)) => {}
            other => panic!("expected ResponseParse, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_json_is_parse_error() {
        assert!(matches!(normalize("[1, 2]", ResultSchema::Rich), Err(MatcherError::ResponseParse(_))));
        assert!(matches!(normalize("42", ResultSchema::Rich), Err(MatcherError::ResponseParse(_))));
    }

    #[test]
    fn test_score_only_response() {
        let normalized = normalize_ok(
            r#"{"score": 92.4, "analysis": "Strong fit", "recommendations": "None"}"#,
            ResultSchema::Score,
        );
        assert_eq!(normalized.result.match_percentage, 92);
        assert_eq!(normalized.result.synthesis, "Strong fit");
        assert_eq!(normalized.result.recommendations, "None");
    }

    #[test]
    fn test_rich_response() {
        let raw = json!({
            "matchPercentage": 83.6,
            "synthesis": "Good overlap",
            "evaluationTable": [
                {"criterion": "Skills", "score": 8.5, "reasons": "Rust", "comments": "no Go"},
                {"criterion": "Experience", "score": 14, "reasons": 5},
                {"score": 3},
                "bogus",
                {"criterion": "Education"}
            ],
            "interpretation": "strongly aligned",
            "recommendations": ["Interview", "Check references"],
            "strengths": ["Rust", 7, "Tokio"],
            "gaps": "none"
        })
        .to_string();

        let normalized = normalize_ok(&raw, ResultSchema::Rich);
        let result = normalized.result;

        assert_eq!(result.match_percentage, 84);
        assert_eq!(result.evaluation_table.len(), 2);
        assert_eq!(result.evaluation_table[0].score, 9);
        assert_eq!(result.evaluation_table[0].comments, "no Go");
        assert_eq!(result.evaluation_table[1].score, 10);
        assert_eq!(result.evaluation_table[1].reasons, "5");
        assert_eq!(result.evaluation_table[1].comments, "");
        assert_eq!(result.recommendations, "Interview\nCheck references");
        assert_eq!(result.strengths, vec!["Rust", "Tokio"]);
        assert!(result.gaps.is_empty());

        let fields: Vec<&str> = normalized.issues.iter().map(|i| i.field.as_str()).collect();
        assert!(fields.contains(&"evaluationTable[2]"));
        assert!(fields.contains(&"evaluationTable[3]"));
        assert!(fields.contains(&"evaluationTable[4]"));
        assert!(fields.contains(&"strengths"));
        assert!(fields.contains(&"gaps"));
    }

    #[test]
    fn test_structured_response_uses_percent_scale_for_criteria() {
        let raw = r#"{
            "overall_match_percentage": 67,
            "criteria_scores": [{"criterion": "Skills Match", "score": 72.5, "explanation": "Most skills present"}],
            "strengths": ["Python"],
            "gaps": ["Cloud"],
            "recommendation": "Proceed to interview"
        }"#;

        let result = normalize_ok(raw, ResultSchema::Structured).result;
        assert_eq!(result.match_percentage, 67);
        assert_eq!(result.evaluation_table[0].score, 73);
        assert_eq!(result.evaluation_table[0].reasons, "Most skills present");
        assert_eq!(result.recommendations, "Proceed to interview");
        assert_eq!(result.gaps, vec!["Cloud"]);
    }

    #[test]
    fn test_string_coercion() {
        let raw = r#"{"synthesis": 42, "interpretation": true, "recommendations": null, "score": "88"}"#;
        let normalized = normalize_ok(raw, ResultSchema::Rich);
        assert_eq!(normalized.result.synthesis, "42");
        assert_eq!(normalized.result.interpretation, "true");
        assert_eq!(normalized.result.recommendations, "");
        assert_eq!(normalized.result.match_percentage, 88);
        assert!(normalized.issues.is_empty());
    }

    #[test]
    fn test_non_numeric_score_is_recorded() {
        let normalized = normalize_ok(r#"{"matchPercentage": "high"}"#, ResultSchema::Rich);
        assert_eq!(normalized.result.match_percentage, 0);
        assert_eq!(normalized.issues, vec![MalformedField::new("matchPercentage", "score is not numeric, using 0")]);
    }

    #[test]
    fn test_boolean_score_is_converted_not_recorded() {
        let normalized = normalize_ok(r#"{"matchPercentage": true}"#, ResultSchema::Rich);
        assert_eq!(normalized.result.match_percentage, 1);
        assert!(normalized.issues.is_empty());
    }

    #[test]
    fn test_fenced_output_with_uppercase_tag() {
        let raw = "```JSON\n{\"matchPercentage\": 55}\n```";
        assert_eq!(normalize_ok(raw, ResultSchema::Rich).result.match_percentage, 55);
    }

    #[test]
    fn test_out_of_range_percentages() {
        assert_eq!(normalize_ok(r#"{"score": -5}"#, ResultSchema::Score).result.match_percentage, 0);
        assert_eq!(normalize_ok(r#"{"score": 150}"#, ResultSchema::Score).result.match_percentage, 100);
    }

    #[test]
    fn test_fenced_output() {
        let raw = "```json\n{\"matchPercentage\": 55}\n```";
        assert_eq!(normalize_ok(raw, ResultSchema::Rich).result.match_percentage, 55);
    }

    #[test]
    fn test_canonical_key_wins_over_alias() {
        let raw = r#"{"matchPercentage": 70, "score": 10}"#;
        assert_eq!(normalize_ok(raw, ResultSchema::Rich).result.match_percentage, 70);
    }

    #[test]
    fn test_coerce_string_object() {
        assert_eq!(coerce_string(&json!({"a": 1})), r#"{"a":1}"#);
        assert_eq!(coerce_string(&json!([1, "x"])), r#"[1,"x"]"#);
    }
}
