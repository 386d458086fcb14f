//! Command-line interface

pub mod args;
mod ask;
mod generate;

pub use args::{Cli, Commands};
pub use ask::handle_ask_command;
pub use generate::handle_generate_command;

use anyhow::{Context, Result};
use std::path::Path;
use trialscribe_core::config::api_keys::load_dotenv;
use trialscribe_core::{ClinicalTrialAssistant, ConfigManager, TrialScribeConfig};

/// Resolve configuration and build the assistant
pub fn load_assistant(
    config_path: Option<&Path>,
    model: Option<&str>,
) -> Result<ClinicalTrialAssistant> {
    load_dotenv()?;

    let manager = match config_path {
        Some(path) => ConfigManager::load_from_file(path)?,
        None => ConfigManager::load()?,
    };
    if let Some(path) = manager.config_path() {
        tracing::info!(path = %path.display(), "using configuration file");
    }

    let mut config: TrialScribeConfig = manager.into_config();
    if let Some(model) = model {
        config.assistant.model = model.to_string();
    }

    ClinicalTrialAssistant::from_config(&config).context("Failed to initialize the assistant")
}
