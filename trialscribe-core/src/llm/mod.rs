//! # Completion service integration
//!
//! - [`provider`]: the [`LLMProvider`] seam and the request/response types
//! - [`providers`]: the OpenAI-compatible HTTP provider
//! - [`client`]: [`CompletionClient`], which adds the fixed request shape,
//!   deadlines, retry and error logging on top of a provider

pub mod client;
pub mod provider;
pub mod providers;

pub use client::{ClientConfig, CompletionClient, CompletionFailure, OperationTag, RetryPolicy};
pub use provider::{
    FinishReason, LLMError, LLMProvider, LLMRequest, LLMResponse, Message, MessageRole, Usage,
};
pub use providers::OpenAIProvider;
