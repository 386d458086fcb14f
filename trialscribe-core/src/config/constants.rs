/// Model ID constants for the completion service
pub mod models {
    pub mod openai {
        pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
        pub const SUPPORTED_MODELS: &[&str] = &[
            "gpt-4o-mini",
            "gpt-4o",
            "gpt-4.1",
            "gpt-4.1-mini",
            "gpt-5",
            "gpt-5-mini",
        ];
    }
}

/// Model validation helpers
pub mod model_helpers {
    use super::models;

    /// Whether the model is one of the known OpenAI chat models.
    ///
    /// Unknown models are still accepted by the client (OpenAI-compatible
    /// gateways expose their own names); this is only used for diagnostics.
    pub fn is_known(model: &str) -> bool {
        models::openai::SUPPORTED_MODELS.contains(&model)
    }
}

/// Fixed sampling configuration sent with every completion request
pub mod sampling {
    pub const TEMPERATURE: f64 = 0.7;
    pub const MAX_TOKENS: u32 = 2_000;
}

/// Prompt text shared by the builder and the completion client
pub mod prompts {
    pub const DEFAULT_SYSTEM_CONTEXT: &str = "You are an expert clinical protocol designer.";

    pub const PROTOCOL_HEADER: &str =
        "Generate a comprehensive clinical trial protocol with the following specifications:";

    pub const QUERY_CONTEXT_INTRO: &str = "Answer the user's question using the clinical trial protocol below as the primary reference. If the protocol does not cover the question, say so and answer from general clinical trial practice.";

    /// The eight sections every generated protocol must cover, in prompt order
    pub const SECTION_CHECKLIST: [&str; 8] = [
        "Study Overview and Objectives",
        "Trial Design and Methodology",
        "Patient Selection (Inclusion/Exclusion)",
        "Treatment Plan and Procedures",
        "Safety Monitoring",
        "Efficacy Assessments",
        "Statistical Considerations",
        "Ethical Considerations",
    ];
}

/// Message role constants to avoid hardcoding strings
pub mod message_roles {
    pub const SYSTEM: &str = "system";
    pub const USER: &str = "user";
    pub const ASSISTANT: &str = "assistant";
}

/// URL constants for API endpoints
pub mod urls {
    pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
}

/// Default configuration values
pub mod defaults {
    use super::models;

    pub const DEFAULT_MODEL: &str = models::openai::DEFAULT_MODEL;
    pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
    pub const DEFAULT_TEMPLATES_PATH: &str = "protocol_templates.json";
    pub const DEFAULT_ERROR_LOG_PATH: &str = "error_log.txt";
    pub const DEFAULT_CONFIG_FILE: &str = "trialscribe.toml";
    pub const DEFAULT_CONFIG_DIR: &str = ".trialscribe";
    pub const DEFAULT_HISTORY_MAX_ENTRIES: usize = 256;
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_USER_AGENT: &str = concat!("trialscribe/", env!("CARGO_PKG_VERSION"));
}

/// Retry defaults for transient completion failures
pub mod retry {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_INITIAL_DELAY_MS: u64 = 500;
    pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
    pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
}

/// Error log operation tags
pub mod error_tags {
    pub const COMPLETION: &str = "Completion service error";
    pub const PROTOCOL_GENERATION: &str = "Protocol generation error";
    pub const QUERY_PROCESSING: &str = "Query processing error";
}
