//! # trialscribe-core
//!
//! Library behind TrialScribe: drafts clinical trial protocols with a hosted
//! chat completion model and answers follow-up questions about them.
//!
//! A call flows through the same components every time:
//!
//! 1. [`templates::TemplateStore`] supplies per-disease default inclusion
//!    criteria and primary endpoints
//! 2. [`prompts::build_protocol_prompt`] renders the request into a
//!    deterministic instruction
//! 3. [`llm::CompletionClient`] sends it with a deadline and retries transient
//!    failures, logging every final failure once
//! 4. [`protocol::structure`] splits the returned text into the fixed
//!    [`protocol::ProtocolSection`]s
//! 5. [`history::HistorySink`] records the result
//!
//! ```rust,no_run
//! use trialscribe_core::{ClinicalTrialAssistant, ProtocolRequest, StudyPhase};
//! use trialscribe_core::config::ConfigManager;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ConfigManager::load()?.into_config();
//! let assistant = ClinicalTrialAssistant::from_config(&config)?;
//!
//! let request = ProtocolRequest::new("psoriasis", StudyPhase::Phase2, 200, 12);
//! let protocol = assistant.generate_protocol(&request).await?;
//! let answer = assistant
//!     .answer_query("What washout period applies to biologics?", Some(&protocol))
//!     .await?;
//! println!("{answer}");
//! # Ok(())
//! # }
//! ```

pub mod assistant;
pub mod config;
pub mod error;
pub mod error_log;
pub mod history;
pub mod llm;
pub mod prompts;
pub mod protocol;
pub mod templates;

pub use assistant::{AssistantBuilder, ClinicalTrialAssistant};
pub use config::{ConfigManager, TrialScribeConfig};
pub use error::{AssistantError, AssistantResult};
pub use error_log::{ErrorLog, ErrorLogRecord, FileErrorLog, MemoryErrorLog};
pub use history::{HistoryEntry, HistorySink, InMemoryHistory, JsonlHistory};
pub use llm::{CompletionClient, CompletionFailure, LLMError, LLMProvider, OperationTag, RetryPolicy};
pub use protocol::{
    AdditionalCriteria, Protocol, ProtocolRequest, ProtocolSection, StructuringFailure, StudyPhase,
};
pub use templates::{Template, TemplateStore};
