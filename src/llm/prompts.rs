//! Prompt templates for CV to job match evaluation

use crate::config::MAX_INPUT_CHARS;
use crate::processing::request::{JobPosting, MatchRequest};
use crate::processing::result::ResultSchema;
use crate::processing::text_processor::truncate_chars;
use log::debug;

/// System and user instructions for a single completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_input_chars: usize,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(MAX_INPUT_CHARS)
    }
}

impl PromptBuilder {
    pub fn new(max_input_chars: usize) -> Self {
        Self { max_input_chars }
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    /// Render the prompt. Identical inputs always give identical output.
    pub fn build(&self, request: &MatchRequest, schema: ResultSchema) -> Prompt {
        let system = fill(SYSTEM_TEMPLATE, &[("{schema}", schema_instructions(schema))]);

        let job = self.render_job(&request.job);
        let cv = truncate_chars(&request.cv_text, self.max_input_chars);
        let user = fill(USER_TEMPLATE, &[("{job}", job.as_str()), ("{cv}", cv)]);

        debug!(
            "Built {:?} prompt: system {} chars, user {} chars",
            schema,
            system.len(),
            user.len()
        );

        Prompt { system, user }
    }

    fn render_job(&self, job: &JobPosting) -> String {
        match job {
            JobPosting::Text(text) => truncate_chars(text, self.max_input_chars).to_string(),
            JobPosting::Fields(fields) => {
                let skills = if fields.skills.is_empty() {
                    "Not specified".to_string()
                } else {
                    fields.skills.join(", ")
                };

                let experience = fields.experience_years_required.to_string();

                fill(
                    JOB_FIELDS_TEMPLATE,
                    &[
                        ("{title}", fields.title.as_str()),
                        ("{description}", truncate_chars(&fields.description, self.max_input_chars)),
                        ("{requirements}", truncate_chars(&fields.requirements, self.max_input_chars)),
                        ("{skills}", skills.as_str()),
                        ("{experience}", experience.as_str()),
                    ],
                )
            }
        }
    }
}

/// Substitute placeholders in a single pass, so inserted text is never re-scanned.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn schema_instructions(schema: ResultSchema) -> &'static str {
    match schema {
        ResultSchema::Score => SCORE_SCHEMA,
        ResultSchema::Rich => RICH_SCHEMA,
        ResultSchema::Structured => STRUCTURED_SCHEMA,
    }
}

const SYSTEM_TEMPLATE: &str = r#"You are an expert HR recruiter specializing in candidate assessment and job matching.
You compare a candidate CV with a job posting and score how well they align.

Respond with strict JSON only: a single JSON object matching the schema below.
Do not add any prose, markdown or code fences outside the JSON object.

{schema}"#;

const SCORE_SCHEMA: &str = r#"SCHEMA:
{
  "score": integer from 0 to 100,
  "analysis": string,
  "recommendations": string
}"#;

const RICH_SCHEMA: &str = r#"SCHEMA:
{
  "matchPercentage": integer from 0 to 100,
  "synthesis": string,
  "evaluationTable": [
    {"criterion": string, "score": integer from 0 to 10, "reasons": string, "comments": string}
  ],
  "interpretation": string,
  "recommendations": string,
  "strengths": [string],
  "gaps": [string]
}"#;

const STRUCTURED_SCHEMA: &str = r#"SCHEMA:
{
  "overall_match_percentage": integer from 0 to 100,
  "criteria_scores": [
    {"criterion": string, "score": integer from 0 to 100, "explanation": string}
  ],
  "strengths": [string],
  "gaps": [string],
  "recommendation": string
}"#;

const JOB_FIELDS_TEMPLATE: &str = r#"Title: {title}
Description: {description}
Requirements: {requirements}
Required Skills: {skills}
Experience Required: {experience} years"#;

const USER_TEMPLATE: &str = r#"Analyze the following CV against the job posting.

<JOB POSTING>
{job}
</JOB POSTING>

<CANDIDATE CV>
{cv}
</CANDIDATE CV>

SCORING RUBRIC (weights of the overall percentage):
1. Skills Match, technical and soft skills: 35%
2. Experience Level, years and relevance: 25%
3. Education & Qualifications: 15%
4. Role Fit with the job responsibilities: 15%
5. Career Trajectory, growth and progression: 10%

INTERPRETATION:
- 80% and above: strongly aligned
- 60% to 79%: partially aligned
- 40% to 59%: weakly aligned
- below 40%: not aligned

Evaluate every rubric criterion, list 3-5 strengths and 3-5 gaps where the schema asks for them,
and give a brief recommendation (1-2 sentences).
Be objective and realistic. A perfect 100% match is rare.
Return only the JSON object."#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::request::JobFields;

    fn structured_request() -> MatchRequest {
        MatchRequest::new(
            "Python developer, 5 years",
            JobPosting::Fields(JobFields {
                title: "Senior Python Engineer".to_string(),
                description: "Build data services".to_string(),
                requirements: "5+ years".to_string(),
                skills: vec!["Python".to_string(), "SQL".to_string()],
                experience_years_required: 5,
            }),
        )
    }

    #[test]
    fn test_free_text_rendering() {
        let request = MatchRequest::from_text("Python developer, 5 years", "Senior Python Engineer, 5+ years required");
        let prompt = PromptBuilder::default().build(&request, ResultSchema::Score);

        assert!(prompt.user.contains("Python developer, 5 years"));
        assert!(prompt.user.contains("Senior Python Engineer, 5+ years required"));
        assert!(prompt.user.contains("<CANDIDATE CV>"));
        assert!(prompt.user.contains("strongly aligned"));
        assert!(prompt.system.contains("\"score\""));
        assert!(prompt.system.contains("strict JSON"));
    }

    #[test]
    fn test_structured_job_rendering() {
        let prompt = PromptBuilder::default().build(&structured_request(), ResultSchema::Structured);

        assert!(prompt.user.contains("Title: Senior Python Engineer"));
        assert!(prompt.user.contains("Required Skills: Python, SQL"));
        assert!(prompt.user.contains("Experience Required: 5 years"));
        assert!(prompt.system.contains("overall_match_percentage"));
    }

    #[test]
    fn test_empty_skills_not_specified() {
        let mut request = structured_request();
        if let JobPosting::Fields(fields) = &mut request.job {
            fields.skills.clear();
        }
        let prompt = PromptBuilder::default().build(&request, ResultSchema::Rich);
        assert!(prompt.user.contains("Required Skills: Not specified"));
        assert!(prompt.system.contains("evaluationTable"));
    }

    #[test]
    fn test_deterministic() {
        let builder = PromptBuilder::default();
        let request = structured_request();
        assert_eq!(builder.build(&request, ResultSchema::Rich), builder.build(&request, ResultSchema::Rich));
    }

    #[test]
    fn test_inputs_are_truncated() {
        let cv = format!("{}{}", "a".repeat(30), "TAIL_CV");
        let job = format!("{}{}", "b".repeat(30), "TAIL_JOB");
        let prompt = PromptBuilder::new(30).build(&MatchRequest::from_text(cv, job), ResultSchema::Rich);

        assert!(prompt.user.contains(&"a".repeat(30)));
        assert!(!prompt.user.contains("TAIL_CV"));
        assert!(!prompt.user.contains("TAIL_JOB"));
    }

    #[test]
    fn test_placeholder_text_in_inputs_is_not_substituted() {
        let request = MatchRequest::from_text("my cv mentions {job}", "job mentions {cv}");
        let prompt = PromptBuilder::default().build(&request, ResultSchema::Rich);
        assert!(prompt.user.contains("my cv mentions {job}"));
        assert!(prompt.user.contains("job mentions {cv}"));
    }

    #[test]
    fn test_fill_keeps_unknown_braces() {
        assert_eq!(fill("{a} {\"x\": 1} {b}", &[("{a}", "1"), ("{b}", "2")]), "1 {\"x\": 1} 2");
    }
}
