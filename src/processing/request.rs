//! Match requests and the stdin document they are built from

use crate::error::{MatcherError, Result};
use crate::processing::normalizer::coerce_string;
use crate::processing::scoring::{clamp_number, to_number};
use crate::processing::text_processor::char_count;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchRequest {
    pub cv_text: String,
    pub job: JobPosting,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobPosting {
    /// Free-form job text
    Text(String),
    Fields(JobFields),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct JobFields {
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub skills: Vec<String>,
    pub experience_years_required: u32,
}

impl MatchRequest {
    pub fn new(cv_text: impl Into<String>, job: JobPosting) -> Self {
        Self {
            cv_text: cv_text.into(),
            job,
        }
    }

    pub fn from_text(cv_text: impl Into<String>, job_text: impl Into<String>) -> Self {
        Self::new(cv_text, JobPosting::Text(job_text.into()))
    }

    /// Parse the stdin JSON document.
    pub fn from_json(input: &str) -> Result<Self> {
        let document: MatchInput = serde_json::from_str(input)
            .map_err(|e| MatcherError::InvalidInput(format!("Input is not a valid match document: {}", e)))?;
        Ok(document.into_request())
    }
}

/// Split a comma-separated skills list, dropping blank entries.
pub fn parse_skills(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Raw stdin document. Every field is optional and `null` is treated as absent.
///
/// Fields are read leniently: a wrong-typed value is coerced rather than
/// rejecting the whole document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInput {
    #[serde(default, deserialize_with = "lenient_text")]
    pub cv_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub job_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub job_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub job_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub job_requirements: Option<String>,
    /// Array of skills or a comma-separated string
    #[serde(default, deserialize_with = "lenient_skills")]
    pub job_skills: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_years")]
    pub experience_required: Option<u32>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Value>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.filter(|value| !value.is_null()))
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    Ok(present(deserializer)?.map(|value| coerce_string(&value)))
}

fn lenient_skills<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error> {
    Ok(present(deserializer)?.map(|value| match value {
        Value::Array(items) => items
            .iter()
            .map(coerce_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        other => parse_skills(&coerce_string(&other)),
    }))
}

/// Years as a number or numeric string; anything else counts as 0.
fn lenient_years<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<u32>, D::Error> {
    Ok(present(deserializer)?.map(|value| clamp_number(to_number(&value), u32::MAX)))
}

impl MatchInput {
    fn has_job_fields(&self) -> bool {
        self.job_title.is_some()
            || self.job_description.is_some()
            || self.job_requirements.is_some()
            || self.job_skills.is_some()
            || self.experience_required.is_some()
    }

    pub fn into_request(self) -> MatchRequest {
        let job = if self.has_job_fields() {
            JobPosting::Fields(JobFields {
                title: self.job_title.unwrap_or_default(),
                // free text doubles as the description when only a title was given
                description: self
                    .job_description
                    .or(self.job_text)
                    .unwrap_or_default(),
                requirements: self.job_requirements.unwrap_or_default(),
                skills: self.job_skills.unwrap_or_default(),
                experience_years_required: self.experience_required.unwrap_or(0),
            })
        } else {
            JobPosting::Text(self.job_text.unwrap_or_default())
        };

        MatchRequest {
            cv_text: self.cv_text.unwrap_or_default(),
            job,
        }
    }
}

/// Character counts reported by the `count` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLengths {
    pub cv_text_length: usize,
    pub job_text_length: usize,
}

impl TextLengths {
    /// Count characters of `cvText` and `jobText`. Other fields are ignored;
    /// malformed input or non-string values count as empty.
    pub fn from_json(input: &str) -> Self {
        let document = match serde_json::from_str::<Value>(input) {
            Ok(document) => document,
            Err(e) => {
                log::warn!("Malformed count input, reporting zero lengths: {}", e);
                return Self::default();
            }
        };

        let length = |key: &str| document.get(key).and_then(Value::as_str).map(char_count).unwrap_or(0);
        Self {
            cv_text_length: length("cvText"),
            job_text_length: length("jobText"),
        }
    }
}
