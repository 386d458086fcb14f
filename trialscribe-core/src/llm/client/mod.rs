//! Completion client
//!
//! Wraps an [`LLMProvider`] with the fixed request shape (one system message,
//! one user message, fixed sampling parameters), a per-attempt deadline,
//! retry with backoff for transient failures, and a single error log record
//! per failed call.

pub mod config;
pub mod retry;

pub use config::ClientConfig;
pub use retry::RetryPolicy;

use crate::config::constants::{defaults, error_tags, prompts, sampling};
use crate::error_log::ErrorLog;
use crate::llm::provider::{LLMError, LLMProvider, LLMRequest, Message};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Which operation a completion call belongs to; prefixes error log records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationTag {
    Completion,
    ProtocolGeneration,
    QueryProcessing,
}

impl OperationTag {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationTag::Completion => error_tags::COMPLETION,
            OperationTag::ProtocolGeneration => error_tags::PROTOCOL_GENERATION,
            OperationTag::QueryProcessing => error_tags::QUERY_PROCESSING,
        }
    }

    /// Error log message for a failure of this operation
    pub fn log_message(self, error: &dyn fmt::Display) -> String {
        format!("{}: {error}", self.as_str())
    }
}

impl fmt::Display for OperationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completion call that failed after all permitted attempts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source} (attempts: {attempts})")]
pub struct CompletionFailure {
    /// Provider calls made; 0 when the request was rejected before sending
    pub attempts: u32,
    pub source: LLMError,
}

impl CompletionFailure {
    pub fn is_transient(&self) -> bool {
        self.source.is_transient()
    }
}

pub struct CompletionClient {
    provider: Arc<dyn LLMProvider>,
    model: String,
    retry_policy: RetryPolicy,
    request_timeout: Duration,
    error_log: Arc<dyn ErrorLog>,
}

impl CompletionClient {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        model: impl Into<String>,
        error_log: Arc<dyn ErrorLog>,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            retry_policy: RetryPolicy::default(),
            request_timeout: Duration::from_secs(defaults::DEFAULT_REQUEST_TIMEOUT_SECS),
            error_log,
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Deadline applied to each provider call
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn error_log(&self) -> &Arc<dyn ErrorLog> {
        &self.error_log
    }

    /// Request shape sent for every completion
    pub fn build_request(&self, prompt: &str, system_context: Option<&str>) -> LLMRequest {
        LLMRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(system_context.unwrap_or(prompts::DEFAULT_SYSTEM_CONTEXT)),
                Message::user(prompt),
            ],
            temperature: Some(sampling::TEMPERATURE),
            max_tokens: Some(sampling::MAX_TOKENS),
        }
    }

    /// Completion text for `prompt`, logging failures as completion errors
    pub async fn complete(
        &self,
        prompt: &str,
        system_context: Option<&str>,
    ) -> Result<String, CompletionFailure> {
        self.complete_for(OperationTag::Completion, prompt, system_context)
            .await
    }

    /// Completion text for `prompt`, logging failures under `tag`
    pub async fn complete_for(
        &self,
        tag: OperationTag,
        prompt: &str,
        system_context: Option<&str>,
    ) -> Result<String, CompletionFailure> {
        let request = self.build_request(prompt, system_context);

        let result = match self.provider.validate_request(&request) {
            Ok(()) => self.send_with_retry(tag, request).await,
            Err(source) => Err(CompletionFailure {
                attempts: 0,
                source,
            }),
        };

        result.inspect_err(|failure| {
            tracing::warn!(
                operation = %tag,
                attempts = failure.attempts,
                transient = failure.is_transient(),
                error = %failure.source,
                "completion failed"
            );
            self.error_log.record(&tag.log_message(failure));
        })
    }

    async fn send_with_retry(
        &self,
        tag: OperationTag,
        request: LLMRequest,
    ) -> Result<String, CompletionFailure> {
        let max_attempts = self.retry_policy.attempts();
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(
                operation = %tag,
                provider = self.provider.name(),
                model = %self.model,
                attempt,
                max_attempts,
                "sending completion request"
            );

            let error = match self.attempt_once(request.clone()).await {
                Ok(content) => {
                    if attempt > 1 {
                        tracing::debug!(operation = %tag, attempt, "completion succeeded after retry");
                    }
                    return Ok(content);
                }
                Err(error) => error,
            };

            if !error.is_transient() || attempt >= max_attempts {
                return Err(CompletionFailure {
                    attempts: attempt,
                    source: error,
                });
            }

            let delay = self.retry_policy.delay_for(attempt);
            tracing::warn!(
                operation = %tag,
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "transient completion failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt_once(&self, request: LLMRequest) -> Result<String, LLMError> {
        let response = tokio::time::timeout(self.request_timeout, self.provider.generate(request))
            .await
            .map_err(|_| {
                LLMError::Timeout(format!(
                    "no response within {} ms",
                    self.request_timeout.as_millis()
                ))
            })??;

        if let Some(usage) = &response.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                finish_reason = ?response.finish_reason,
                "completion received"
            );
        }

        response
            .content
            .ok_or_else(|| LLMError::MalformedResponse("response carried no text".to_string()))
    }
}
