//! Provider abstraction for chat completion services
//!
//! A provider turns one [`LLMRequest`] into one [`LLMResponse`] with a single
//! outbound call. Retry, deadlines and error logging live one layer up in
//! [`crate::llm::client::CompletionClient`].

use crate::config::constants::message_roles;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LLMRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    /// Role string for OpenAI-compatible APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => message_roles::SYSTEM,
            MessageRole::User => message_roles::USER,
            MessageRole::Assistant => message_roles::ASSISTANT,
        }
    }
}

/// Chat completion response
#[derive(Debug, Clone, PartialEq)]
pub struct LLMResponse {
    pub content: Option<String>,
    pub usage: Option<Usage>,
    pub finish_reason: FinishReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Other(String),
}

impl FinishReason {
    pub fn from_api(value: &str) -> Self {
        match value {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            other => FinishReason::Other(other.to_string()),
        }
    }
}

/// Chat completion provider
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Provider name (e.g., "openai")
    fn name(&self) -> &str;

    /// Generate completion
    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse, LLMError>;

    /// Models this provider is known to serve
    fn supported_models(&self) -> Vec<String> {
        Vec::new()
    }

    /// Validate request for this provider
    fn validate_request(&self, request: &LLMRequest) -> Result<(), LLMError> {
        if request.messages.is_empty() {
            return Err(LLMError::InvalidRequest(
                "Messages cannot be empty".to_string(),
            ));
        }

        if request.model.trim().is_empty() {
            return Err(LLMError::InvalidRequest(
                "Model cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LLMError {
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),
    #[error("Request timed out: {0}")]
    Timeout(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl LLMError {
    /// Whether the same request may succeed if retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LLMError::RateLimit(_)
                | LLMError::Timeout(_)
                | LLMError::Network(_)
                | LLMError::Server { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LLMError::RateLimit("slow down".into()).is_transient());
        assert!(LLMError::Timeout("60s".into()).is_transient());
        assert!(LLMError::Network("reset".into()).is_transient());
        assert!(
            LLMError::Server {
                status: 503,
                message: "overloaded".into()
            }
            .is_transient()
        );

        assert!(!LLMError::Authentication("bad key".into()).is_transient());
        assert!(!LLMError::InvalidRequest("bad model".into()).is_transient());
        assert!(!LLMError::MalformedResponse("no choices".into()).is_transient());
    }

    #[test]
    fn test_message_roles() {
        assert_eq!(Message::system("s").role.as_str(), "system");
        assert_eq!(Message::user("u").role.as_str(), "user");
        assert_eq!(Message::assistant("a").role.as_str(), "assistant");
        assert_eq!(serde_json::to_value(MessageRole::User).unwrap(), "user");
    }

    #[test]
    fn test_finish_reason_from_api() {
        assert_eq!(FinishReason::from_api("stop"), FinishReason::Stop);
        assert_eq!(FinishReason::from_api("length"), FinishReason::Length);
        assert_eq!(
            FinishReason::from_api("tool_calls"),
            FinishReason::Other("tool_calls".to_string())
        );
    }
}
