use crate::config::constants::{model_helpers, models, urls};
use crate::llm::client::ClientConfig;
use crate::llm::provider::{
    FinishReason, LLMError, LLMProvider, LLMRequest, LLMResponse, Usage,
};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::{Value, json};

/// Longest provider error body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 500;

/// OpenAI-compatible chat completions provider
pub struct OpenAIProvider {
    api_key: String,
    http_client: HttpClient,
    base_url: String,
    model: String,
}

impl OpenAIProvider {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        config: &ClientConfig,
    ) -> Result<Self, LLMError> {
        let http_client = HttpClient::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(config.pool_idle_timeout)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| LLMError::InvalidRequest(format!("Failed to build HTTP client: {e}")))?;

        let model = model.into();
        if !model_helpers::is_known(&model) {
            tracing::debug!(%model, "model is not in the known OpenAI model list");
        }

        Ok(Self {
            api_key: api_key.into(),
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model,
        })
    }

    /// Provider for the public OpenAI endpoint with default settings
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self, LLMError> {
        Self::new(
            api_key,
            models::openai::DEFAULT_MODEL,
            urls::OPENAI_API_BASE,
            &ClientConfig::default(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse, LLMError> {
        self.validate_request(&request)?;
        let openai_request = convert_to_openai_format(&request);

        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&openai_request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(map_status_error(status.as_u16(), &error_text));
        }

        let openai_response: Value = response
            .json()
            .await
            .map_err(|e| LLMError::MalformedResponse(format!("Failed to parse response: {e}")))?;

        parse_openai_response(&openai_response)
    }

    fn supported_models(&self) -> Vec<String> {
        models::openai::SUPPORTED_MODELS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

/// Request body for `POST /chat/completions`
pub(crate) fn convert_to_openai_format(request: &LLMRequest) -> Value {
    let messages: Vec<Value> = request
        .messages
        .iter()
        .map(|msg| {
            json!({
                "role": msg.role.as_str(),
                "content": msg.content
            })
        })
        .collect();

    let mut openai_request = json!({
        "model": request.model,
        "messages": messages,
    });

    if let Some(temperature) = request.temperature {
        openai_request["temperature"] = json!(temperature);
    }

    if let Some(max_tokens) = request.max_tokens {
        openai_request["max_tokens"] = json!(max_tokens);
    }

    openai_request
}

pub(crate) fn parse_openai_response(response_json: &Value) -> Result<LLMResponse, LLMError> {
    let choices = response_json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| LLMError::MalformedResponse("missing choices".to_string()))?;

    let choice = choices
        .first()
        .ok_or_else(|| LLMError::MalformedResponse("no choices in response".to_string()))?;

    let message = choice
        .get("message")
        .ok_or_else(|| LLMError::MalformedResponse("missing message".to_string()))?;

    let content = message
        .get("content")
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| LLMError::MalformedResponse("missing message content".to_string()))?;

    let finish_reason = choice
        .get("finish_reason")
        .and_then(|fr| fr.as_str())
        .map(FinishReason::from_api)
        .unwrap_or(FinishReason::Stop);

    let token_count = |usage: &Value, key: &str| {
        usage
            .get(key)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0)
    };
    let usage = response_json.get("usage").map(|u| Usage {
        prompt_tokens: token_count(u, "prompt_tokens"),
        completion_tokens: token_count(u, "completion_tokens"),
        total_tokens: token_count(u, "total_tokens"),
    });

    Ok(LLMResponse {
        content: Some(content),
        usage,
        finish_reason,
    })
}

/// Classify a non-success HTTP status
pub(crate) fn map_status_error(status: u16, body: &str) -> LLMError {
    let message = extract_error_message(body)
        .unwrap_or_else(|| format!("HTTP {status}: {}", truncate(body.trim())));

    match status {
        401 | 403 => LLMError::Authentication(message),
        429 => LLMError::RateLimit(message),
        408 => LLMError::Timeout(message),
        400..=499 => LLMError::InvalidRequest(message),
        _ => LLMError::Server { status, message },
    }
}

fn map_transport_error(err: reqwest::Error) -> LLMError {
    if err.is_timeout() {
        LLMError::Timeout(err.to_string())
    } else {
        LLMError::Network(err.to_string())
    }
}

/// `error.message` from an OpenAI-style error body
fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .filter(|m| !m.trim().is_empty())
        .map(|m| m.to_string())
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_BODY_CHARS {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::Message;

    fn sample_request() -> LLMRequest {
        LLMRequest {
            model: "gpt-4o-mini".to_string(),
            messages: vec![
                Message::system("You are an expert clinical protocol designer."),
                Message::user("Draft a protocol"),
            ],
            temperature: Some(0.7),
            max_tokens: Some(2000),
        }
    }

    #[test]
    fn test_convert_to_openai_format() {
        let body = convert_to_openai_format(&sample_request());
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["temperature"], 0.7);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "Draft a protocol");
    }

    #[test]
    fn test_sampling_values_are_sent_exactly() {
        use crate::config::constants::sampling;

        let mut request = sample_request();
        request.temperature = Some(sampling::TEMPERATURE);
        request.max_tokens = Some(sampling::MAX_TOKENS);
        let wire = convert_to_openai_format(&request).to_string();
        assert!(wire.contains(r#""temperature":0.7"#), "{wire}");
        assert!(!wire.contains("0.699"), "{wire}");
        assert!(wire.contains(r#""max_tokens":2000"#), "{wire}");
    }

    #[test]
    fn test_parse_openai_response() {
        let body = json!({
            "choices": [{
                "message": {"role": "assistant", "content": "## Overview\nStudy"},
                "finish_reason": "length"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 2000, "total_tokens": 2120}
        });

        let response = parse_openai_response(&body).unwrap();
        assert_eq!(response.content.as_deref(), Some("## Overview\nStudy"));
        assert_eq!(response.finish_reason, FinishReason::Length);
        assert_eq!(response.usage.unwrap().total_tokens, 2120);
    }

    #[test]
    fn test_parse_rejects_missing_content() {
        let empty = json!({"choices": []});
        assert!(matches!(
            parse_openai_response(&empty),
            Err(LLMError::MalformedResponse(_))
        ));

        let null_content = json!({"choices": [{"message": {"content": null}}]});
        assert!(matches!(
            parse_openai_response(&null_content),
            Err(LLMError::MalformedResponse(_))
        ));

        assert!(matches!(
            parse_openai_response(&json!({"id": "x"})),
            Err(LLMError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(
            map_status_error(401, body),
            LLMError::Authentication("Incorrect API key provided".to_string())
        );
        assert!(matches!(map_status_error(403, ""), LLMError::Authentication(_)));
        assert!(matches!(map_status_error(429, ""), LLMError::RateLimit(_)));
        assert!(matches!(map_status_error(408, ""), LLMError::Timeout(_)));
        assert!(matches!(map_status_error(404, ""), LLMError::InvalidRequest(_)));
        assert!(matches!(map_status_error(422, ""), LLMError::InvalidRequest(_)));
        assert_eq!(
            map_status_error(503, "upstream overloaded"),
            LLMError::Server {
                status: 503,
                message: "HTTP 503: upstream overloaded".to_string()
            }
        );
    }

    #[test]
    fn test_long_error_bodies_are_truncated() {
        let body = "x".repeat(2_000);
        let LLMError::Server { message, .. } = map_status_error(500, &body) else {
            panic!("expected server error");
        };
        assert!(message.len() < 600);
        assert!(message.ends_with("..."));
    }

    #[test]
    fn test_provider_construction() {
        let provider = OpenAIProvider::new(
            "sk-test",
            "gpt-4o",
            "http://localhost:8080/v1/",
            &ClientConfig::default(),
        )
        .unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "gpt-4o");
        assert_eq!(provider.base_url(), "http://localhost:8080/v1");
        assert!(provider.supported_models().contains(&"gpt-4o-mini".to_string()));
    }

    #[test]
    fn test_validate_request() {
        let provider = OpenAIProvider::with_api_key("sk-test").unwrap();
        let mut request = sample_request();
        assert!(provider.validate_request(&request).is_ok());
        request.messages.clear();
        assert!(provider.validate_request(&request).is_err());
    }
}
