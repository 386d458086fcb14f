use crate::config::constants::defaults;
use crate::config::{ApiConfig, AssistantConfig, HistoryConfig, RetrySettings};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure for TrialScribe
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrialScribeConfig {
    /// Model and file locations
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Completion service endpoint
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry policy for transient failures
    #[serde(default)]
    pub retry: RetrySettings,

    /// History retention
    #[serde(default)]
    pub history: HistoryConfig,
}

impl TrialScribeConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse configuration")
    }

    /// Create sample configuration file
    pub fn create_sample_config<P: AsRef<Path>>(output: P) -> Result<()> {
        let output = output.as_ref();
        let default_config = TrialScribeConfig::default();
        let config_content = toml::to_string_pretty(&default_config)
            .context("Failed to serialize default configuration")?;

        fs::write(output, config_content)
            .with_context(|| format!("Failed to write config file: {}", output.display()))?;

        Ok(())
    }

    /// Resolve relative file paths against `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        resolve(&mut self.assistant.templates_path);
        resolve(&mut self.assistant.error_log_path);
        if let Some(path) = self.history.path.as_mut() {
            resolve(path);
        }
    }
}

/// Configuration manager for loading configurations
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: TrialScribeConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        Self::load_from_workspace(std::env::current_dir()?)
    }

    /// Get the user's home directory path
    fn get_home_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            return Some(PathBuf::from(home));
        }

        if let Ok(userprofile) = std::env::var("USERPROFILE") {
            return Some(PathBuf::from(userprofile));
        }

        dirs::home_dir()
    }

    /// Load configuration from a specific workspace
    ///
    /// Lookup order: `<workspace>/trialscribe.toml`,
    /// `<workspace>/.trialscribe/trialscribe.toml`,
    /// `~/.trialscribe/trialscribe.toml`. Defaults are used when none exist.
    pub fn load_from_workspace(workspace: impl AsRef<Path>) -> Result<Self> {
        let workspace = workspace.as_ref();

        let config_path = workspace.join(defaults::DEFAULT_CONFIG_FILE);
        if config_path.exists() {
            return Self::load_from_file(&config_path);
        }

        let fallback_path = workspace
            .join(defaults::DEFAULT_CONFIG_DIR)
            .join(defaults::DEFAULT_CONFIG_FILE);
        if fallback_path.exists() {
            return Self::load_from_file(&fallback_path);
        }

        if let Some(home_dir) = Self::get_home_dir() {
            let home_config_path = home_dir
                .join(defaults::DEFAULT_CONFIG_DIR)
                .join(defaults::DEFAULT_CONFIG_FILE);
            if home_config_path.exists() {
                return Self::load_from_file(&home_config_path);
            }
        }

        tracing::debug!(workspace = %workspace.display(), "no config file found, using defaults");
        Ok(Self {
            config: TrialScribeConfig::default(),
            config_path: None,
        })
    }

    /// Load configuration from a specific file
    ///
    /// Relative paths inside the file are resolved against the file's
    /// directory.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: TrialScribeConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        if let Some(parent) = path.parent() {
            config.resolve_paths(parent);
        }

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &TrialScribeConfig {
        &self.config
    }

    /// Mutable access for command-line overrides
    pub fn config_mut(&mut self) -> &mut TrialScribeConfig {
        &mut self.config
    }

    /// Consume the manager and return the configuration
    pub fn into_config(self) -> TrialScribeConfig {
        self.config
    }

    /// Get the configuration file path (if loaded from file)
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
