//! Clinical trial assistant facade
//!
//! Composes the template store, prompt builder, completion client, structurer
//! and the two logs into the two public operations.

use crate::config::TrialScribeConfig;
use crate::config::api_keys::{ApiKeySources, get_api_key_with};
use crate::error::AssistantError;
use crate::error_log::{ErrorLog, FileErrorLog};
use crate::history::{HistoryEntry, HistorySink, InMemoryHistory, JsonlHistory};
use crate::llm::{ClientConfig, CompletionClient, LLMProvider, OpenAIProvider, OperationTag, RetryPolicy};
use crate::prompts::{build_protocol_prompt, build_query_context, format_query_response};
use crate::protocol::{Protocol, ProtocolRequest, structure};
use crate::templates::TemplateStore;
use std::sync::Arc;
use std::time::Duration;

/// Builds a [`ClinicalTrialAssistant`] from configuration plus optional overrides
pub struct AssistantBuilder {
    config: TrialScribeConfig,
    api_key: Option<String>,
    provider: Option<Arc<dyn LLMProvider>>,
    templates: Option<TemplateStore>,
    error_log: Option<Arc<dyn ErrorLog>>,
    history: Option<Arc<dyn HistorySink>>,
    retry_policy: Option<RetryPolicy>,
    request_timeout: Option<Duration>,
}

impl AssistantBuilder {
    /// Builder without credential resolution; a provider must be injected or
    /// a key must be resolvable at [`AssistantBuilder::build`]
    pub fn new(config: TrialScribeConfig) -> Self {
        Self {
            config,
            api_key: None,
            provider: None,
            templates: None,
            error_log: None,
            history: None,
            retry_policy: None,
            request_timeout: None,
        }
    }

    /// Builder with the API key resolved up front from the environment or
    /// the config file
    pub fn from_config(config: &TrialScribeConfig) -> Result<Self, AssistantError> {
        Self::from_config_with(config, |name| std::env::var(name).ok())
    }

    /// Same as [`AssistantBuilder::from_config`] with an injectable
    /// environment lookup
    pub fn from_config_with<F>(config: &TrialScribeConfig, lookup: F) -> Result<Self, AssistantError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = resolve_api_key(config, lookup)?;
        let mut builder = Self::new(config.clone());
        builder.api_key = Some(api_key);
        Ok(builder)
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.assistant.model = model.into();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn templates(mut self, templates: TemplateStore) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn error_log(mut self, error_log: Arc<dyn ErrorLog>) -> Self {
        self.error_log = Some(error_log);
        self
    }

    pub fn history(mut self, history: Arc<dyn HistorySink>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = Some(retry_policy);
        self
    }

    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = Some(request_timeout);
        self
    }

    pub fn build(self) -> Result<ClinicalTrialAssistant, AssistantError> {
        let config = self.config;
        let model = config.assistant.model.clone();
        if model.trim().is_empty() {
            return Err(AssistantError::Configuration(
                "assistant.model cannot be empty".to_string(),
            ));
        }

        let provider: Arc<dyn LLMProvider> = match self.provider {
            Some(provider) => provider,
            None => {
                let api_key = match self.api_key {
                    Some(key) => key,
                    None => resolve_api_key(&config, |name| std::env::var(name).ok())?,
                };
                let provider = OpenAIProvider::new(
                    api_key,
                    model.clone(),
                    config.api.base_url.clone(),
                    &ClientConfig::from(&config.api),
                )
                .map_err(|e| AssistantError::Configuration(e.to_string()))?;
                Arc::new(provider)
            }
        };

        let templates = self
            .templates
            .unwrap_or_else(|| TemplateStore::load(&config.assistant.templates_path));

        let error_log = self
            .error_log
            .unwrap_or_else(|| Arc::new(FileErrorLog::new(&config.assistant.error_log_path)));

        let history: Arc<dyn HistorySink> = match self.history {
            Some(history) => history,
            None => match &config.history.path {
                Some(path) => Arc::new(JsonlHistory::new(path)),
                None => Arc::new(InMemoryHistory::with_max_entries(config.history.max_entries)),
            },
        };

        let client = CompletionClient::new(provider, model, Arc::clone(&error_log))
            .with_retry_policy(
                self.retry_policy
                    .unwrap_or_else(|| RetryPolicy::from(&config.retry)),
            )
            .with_request_timeout(
                self.request_timeout
                    .unwrap_or_else(|| config.api.request_timeout()),
            );

        tracing::debug!(
            provider = client.provider_name(),
            model = client.model(),
            templates = templates.len(),
            "assistant ready"
        );

        Ok(ClinicalTrialAssistant {
            templates,
            client,
            history,
            error_log,
        })
    }
}

fn resolve_api_key<F>(config: &TrialScribeConfig, lookup: F) -> Result<String, AssistantError>
where
    F: Fn(&str) -> Option<String>,
{
    let sources = ApiKeySources::new(config.api.api_key_env.clone(), config.api.api_key.clone());
    get_api_key_with(&sources, lookup).map_err(|e| AssistantError::Configuration(e.to_string()))
}

/// Drafts clinical trial protocols and answers questions about them
pub struct ClinicalTrialAssistant {
    templates: TemplateStore,
    client: CompletionClient,
    history: Arc<dyn HistorySink>,
    error_log: Arc<dyn ErrorLog>,
}

impl ClinicalTrialAssistant {
    pub fn builder(config: TrialScribeConfig) -> AssistantBuilder {
        AssistantBuilder::new(config)
    }

    /// Assistant wired entirely from configuration
    pub fn from_config(config: &TrialScribeConfig) -> Result<Self, AssistantError> {
        AssistantBuilder::from_config(config)?.build()
    }

    /// Generate, structure and record a protocol
    pub async fn generate_protocol(
        &self,
        request: &ProtocolRequest,
    ) -> Result<Protocol, AssistantError> {
        const TAG: OperationTag = OperationTag::ProtocolGeneration;

        if let Err(e) = request.validate() {
            self.error_log.record(&TAG.log_message(&e));
            return Err(e);
        }

        let template = self.templates.get(&request.disease_type);
        if template.is_empty() {
            tracing::debug!(disease = %request.disease_type, "no template for disease type");
        }
        let prompt = build_protocol_prompt(request, template);

        let raw = self.client.complete_for(TAG, &prompt, None).await?;

        let protocol = match structure(&raw) {
            Ok(protocol) => protocol,
            Err(e) => {
                tracing::warn!(error = %e, chars = raw.len(), "could not structure completion");
                self.error_log.record(&TAG.log_message(&e));
                return Err(AssistantError::Structuring(e));
            }
        };

        let entry = self.history.record(protocol.clone());
        tracing::info!(
            disease = %request.disease_type,
            phase = %request.phase,
            recorded_at = %entry.timestamp,
            "protocol generated"
        );
        Ok(protocol)
    }

    /// Answer a free-form question, optionally about a given protocol
    pub async fn answer_query(
        &self,
        query: &str,
        protocol_context: Option<&Protocol>,
    ) -> Result<String, AssistantError> {
        const TAG: OperationTag = OperationTag::QueryProcessing;

        if query.trim().is_empty() {
            let e = AssistantError::InvalidRequest("query cannot be empty".to_string());
            self.error_log.record(&TAG.log_message(&e));
            return Err(e);
        }

        let context = build_query_context(protocol_context);
        let raw = self.client.complete_for(TAG, query, Some(&context)).await?;
        Ok(format_query_response(&raw))
    }

    /// Recorded protocols in generation order
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.entries()
    }

    pub fn templates(&self) -> &TemplateStore {
        &self.templates
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }
}
