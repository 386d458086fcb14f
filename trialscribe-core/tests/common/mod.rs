#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use trialscribe_core::llm::{FinishReason, LLMRequest, LLMResponse, Usage};
use trialscribe_core::{
    AssistantBuilder, ClinicalTrialAssistant, InMemoryHistory, LLMError, LLMProvider,
    MemoryErrorLog, RetryPolicy, TemplateStore, TrialScribeConfig,
};

/// A completion as a model typically formats an eight-section protocol
pub const PSORIASIS_COMPLETION: &str = "\
# Clinical Trial Protocol: Moderate-to-Severe Plaque Psoriasis (Phase 2)

## 1. Study Overview and Objectives
A randomized, double-blind, placebo-controlled study of 200 patients over 12 weeks.

**Primary Objective:** Evaluate efficacy of the investigational product.

## 2. Trial Design and Methodology
Parallel-group design with 1:1 randomization.

## 3. Patient Selection (Inclusion/Exclusion)
Inclusion Criteria:
- Adults aged 18-65 years
- PASI score ≥ 12

Exclusion Criteria:
- Prior biologic therapy within 12 weeks

## 4. Treatment Plan and Procedures
Subcutaneous dosing every 2 weeks.

## 5. Safety Monitoring
Adverse events are recorded at every visit.

## 6. Efficacy Assessments
PASI 75 at Week 12; IGA score of 0/1 at Week 12.

## 7. Statistical Considerations
Two-sided alpha of 0.05.

## 8. Ethical Considerations
Conducted under ICH-GCP with IRB approval.
";

/// Mock provider replaying scripted results and capturing requests
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<String, LLMError>>>,
    requests: Mutex<Vec<LLMRequest>>,
    fallback: Option<String>,
}

impl MockProvider {
    /// Always answers with `content`
    pub fn always(content: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            fallback: Some(content.to_string()),
        }
    }

    /// Replays `responses` in order, then fails with a network error
    pub fn scripted(responses: Vec<Result<String, LLMError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            fallback: None,
        }
    }

    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl LLMProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: LLMRequest) -> Result<LLMResponse, LLMError> {
        self.requests.lock().push(request);
        let next = self.responses.lock().pop_front();
        let content = match (next, &self.fallback) {
            (Some(result), _) => result?,
            (None, Some(content)) => content.clone(),
            (None, None) => return Err(LLMError::Network("no scripted response".to_string())),
        };

        Ok(LLMResponse {
            content: Some(content),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            }),
            finish_reason: FinishReason::Stop,
        })
    }
}

/// Everything a test needs to inspect after driving the assistant
pub struct Harness {
    pub assistant: ClinicalTrialAssistant,
    pub provider: Arc<MockProvider>,
    pub error_log: Arc<MemoryErrorLog>,
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_multiplier: 2.0,
    }
}

pub fn harness(provider: MockProvider) -> Harness {
    harness_with(provider, |builder| builder)
}

pub fn harness_with(
    provider: MockProvider,
    customize: impl FnOnce(AssistantBuilder) -> AssistantBuilder,
) -> Harness {
    let provider = Arc::new(provider);
    let error_log = Arc::new(MemoryErrorLog::new());

    let builder = AssistantBuilder::new(TrialScribeConfig::default())
        .provider(provider.clone())
        .templates(TemplateStore::builtin())
        .error_log(error_log.clone())
        .history(Arc::new(InMemoryHistory::unbounded()))
        .retry_policy(fast_retry());

    let assistant = customize(builder)
        .build()
        .unwrap_or_else(|e| panic!("assistant should build: {e}"));

    Harness {
        assistant,
        provider,
        error_log,
    }
}
