//! TrialScribe Configuration Module
//!
//! This module handles loading and managing configuration from trialscribe.toml
//! files: the model and file locations used by the assistant, the completion
//! service endpoint, retry behavior and history retention.

pub mod api_keys;
pub mod constants;
pub mod loader;

pub use loader::{ConfigManager, TrialScribeConfig};

use constants::{defaults, retry, urls};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Assistant-wide settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssistantConfig {
    /// Chat completion model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Disease template file (JSON, or TOML by extension)
    #[serde(default = "default_templates_path")]
    pub templates_path: PathBuf,

    /// Append-only error log file
    #[serde(default = "default_error_log_path")]
    pub error_log_path: PathBuf,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            templates_path: default_templates_path(),
            error_log_path: default_error_log_path(),
        }
    }
}

/// Completion service endpoint settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Inline API key; the environment variable takes precedence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Deadline for a single completion attempt
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    /// TCP connect timeout
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            api_key: None,
            request_timeout_seconds: default_request_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// Retry settings for transient completion failures
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrySettings {
    /// Total attempts including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Cap for exponential backoff
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Protocol history retention
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// Maximum in-memory entries; 0 keeps everything
    #[serde(default = "default_history_max_entries")]
    pub max_entries: usize,

    /// Persist history as JSON lines instead of keeping it in memory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_history_max_entries(),
            path: None,
        }
    }
}

fn default_model() -> String {
    defaults::DEFAULT_MODEL.to_string()
}
fn default_templates_path() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_TEMPLATES_PATH)
}
fn default_error_log_path() -> PathBuf {
    PathBuf::from(defaults::DEFAULT_ERROR_LOG_PATH)
}
fn default_base_url() -> String {
    urls::OPENAI_API_BASE.to_string()
}
fn default_api_key_env() -> String {
    defaults::DEFAULT_API_KEY_ENV.to_string()
}
fn default_request_timeout() -> u64 {
    defaults::DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_connect_timeout() -> u64 {
    defaults::DEFAULT_CONNECT_TIMEOUT_SECS
}
fn default_max_attempts() -> u32 {
    retry::DEFAULT_MAX_ATTEMPTS
}
fn default_initial_delay_ms() -> u64 {
    retry::DEFAULT_INITIAL_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    retry::DEFAULT_MAX_DELAY_MS
}
fn default_backoff_multiplier() -> f64 {
    retry::DEFAULT_BACKOFF_MULTIPLIER
}
fn default_history_max_entries() -> usize {
    defaults::DEFAULT_HISTORY_MAX_ENTRIES
}
