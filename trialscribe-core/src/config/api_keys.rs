//! API key management for the completion service.
//!
//! Keys are resolved from environment variables first (optionally populated
//! from a `.env` file), then from the configuration file. Resolution happens
//! once, when the assistant is constructed, so a missing key fails fast
//! before any network access.

use anyhow::Result;
use std::env;

use super::constants::defaults;

/// Where to look for the completion service API key
#[derive(Debug, Clone)]
pub struct ApiKeySources {
    /// Environment variable holding the key
    pub env_var: String,
    /// API key from configuration file
    pub config_value: Option<String>,
}

impl Default for ApiKeySources {
    fn default() -> Self {
        Self {
            env_var: defaults::DEFAULT_API_KEY_ENV.to_string(),
            config_value: None,
        }
    }
}

impl ApiKeySources {
    pub fn new(env_var: impl Into<String>, config_value: Option<String>) -> Self {
        Self {
            env_var: env_var.into(),
            config_value,
        }
    }
}

/// Load environment variables from .env file
///
/// A missing `.env` file is not an error. A malformed one is reported and
/// otherwise ignored.
pub fn load_dotenv() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "loaded environment variables");
            Ok(())
        }
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            tracing::warn!(error = %e, "failed to load .env file");
            Ok(())
        }
    }
}

/// Get the API key with environment-first fallback
///
/// 1. The environment variable named by `sources.env_var`
/// 2. The configuration file value
///
/// Empty values are treated as absent.
pub fn get_api_key(sources: &ApiKeySources) -> Result<String> {
    get_api_key_with(sources, |name| env::var(name).ok())
}

/// Same as [`get_api_key`] with an injectable environment lookup.
pub fn get_api_key_with<F>(sources: &ApiKeySources, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = lookup(&sources.env_var) {
        if !key.trim().is_empty() {
            return Ok(key);
        }
    }

    if let Some(key) = &sources.config_value {
        if !key.trim().is_empty() {
            return Ok(key.clone());
        }
    }

    Err(anyhow::anyhow!(
        "No API key found for the completion service. Set {} environment variable (or add to .env file) or configure api.api_key in {}",
        sources.env_var,
        defaults::DEFAULT_CONFIG_FILE
    ))
}
