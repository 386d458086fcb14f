use crate::llm::client::CompletionFailure;
use crate::protocol::StructuringFailure;
use thiserror::Error;

/// Errors surfaced by [`crate::ClinicalTrialAssistant`]
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Missing credential or unusable configuration, raised at construction
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Completion(#[from] CompletionFailure),

    #[error("could not structure protocol: {0}")]
    Structuring(#[from] StructuringFailure),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AssistantError {
    /// True when retrying the same call later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            AssistantError::Completion(failure) => failure.is_transient(),
            _ => false,
        }
    }
}

pub type AssistantResult<T> = std::result::Result<T, AssistantError>;
