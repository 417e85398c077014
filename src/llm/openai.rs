//! OpenAI chat-completions backend

use crate::config::EvaluatorConfig;
use crate::error::{MatcherError, Result};
use crate::llm::backend::CompletionBackend;
use crate::llm::prompts::Prompt;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Network-backed evaluator. One POST per evaluation, bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct OpenAiBackend {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f64,
}

impl OpenAiBackend {
    pub fn new(settings: &EvaluatorConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| MatcherError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", settings.api_base_url.trim_end_matches('/')),
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat { kind: "json_object" },
        };

        debug!("POST {} (model {})", self.endpoint, self.model);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(MatcherError::ExternalService(format!(
                "completion API returned {}: {}",
                status, message
            )));
        }

        let body: ChatResponse = response.json().await?;

        if let Some(usage) = &body.usage {
            debug!(
                "Completion usage: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .unwrap_or_else(|| "{}".to_string());

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(server: &MockServer) -> EvaluatorConfig {
        EvaluatorConfig {
            api_base_url: format!("{}/v1", server.uri()),
            ..EvaluatorConfig::default()
        }
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "be strict".to_string(),
            user: "compare".to_string(),
        }
    }

    fn completion(content: serde_json::Value) -> serde_json::Value {
        json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
        })
    }

    #[tokio::test]
    async fn test_successful_completion() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(bearer_token("sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-2024-08-06",
                "temperature": 0.3,
                "response_format": {"type": "json_object"},
                "messages": [
                    {"role": "system", "content": "be strict"},
                    {"role": "user", "content": "compare"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(json!("{\"score\": 70}"))))
            .expect(1)
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new(&settings(&server), "sk-test".to_string()).unwrap();
        let content = backend.complete(&prompt()).await.unwrap();
        assert_eq!(content, "{\"score\": 70}");
    }

    #[tokio::test]
    async fn test_null_content_becomes_empty_object() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(serde_json::Value::Null)))
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new(&settings(&server), "sk-test".to_string()).unwrap();
        assert_eq!(backend.complete(&prompt()).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_no_choices_becomes_empty_object() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new(&settings(&server), "sk-test".to_string()).unwrap();
        assert_eq!(backend.complete(&prompt()).await.unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_error_status_is_external_service_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "Incorrect API key provided"}})),
            )
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new(&settings(&server), "sk-bad".to_string()).unwrap();
        match backend.complete(&prompt()).await {
            Err(MatcherError::ExternalService(message)) => {
                assert!(message.contains("401"));
                assert!(message.contains("Incorrect API key provided"));
            }
            other => panic!("expected ExternalService, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new(&settings(&server), "sk-test".to_string()).unwrap();
        assert!(matches!(
            backend.complete(&prompt()).await,
            Err(MatcherError::ExternalService(_))
        ));
    }

    #[tokio::test]
    async fn test_timeout_is_external_service_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion(json!("{}")))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut settings = settings(&server);
        settings.timeout_secs = 1;
        let backend = OpenAiBackend::new(&settings, "sk-test".to_string()).unwrap();

        match backend.complete(&prompt()).await {
            Err(MatcherError::ExternalService(message)) => assert!(message.contains("timed out")),
            other => panic!("expected ExternalService, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_service_is_external_service_error() {
        let settings = EvaluatorConfig {
            api_base_url: "http://127.0.0.1:9".to_string(),
            ..EvaluatorConfig::default()
        };
        let backend = OpenAiBackend::new(&settings, "sk-test".to_string()).unwrap();
        assert!(matches!(
            backend.complete(&prompt()).await,
            Err(MatcherError::ExternalService(_))
        ));
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let settings = EvaluatorConfig {
            api_base_url: "https://example.test/v1/".to_string(),
            ..EvaluatorConfig::default()
        };
        let backend = OpenAiBackend::new(&settings, "sk".to_string()).unwrap();
        assert_eq!(backend.endpoint, "https://example.test/v1/chat/completions");
        assert_eq!(backend.model(), "gpt-4o-2024-08-06");
    }
}
