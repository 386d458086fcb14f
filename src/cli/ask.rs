use super::args::AskArgs;
use anyhow::{Context, Result};
use std::fs;
use trialscribe_core::{ClinicalTrialAssistant, Protocol};

/// Handle the ask command - single question, optional protocol context
pub async fn handle_ask_command(assistant: &ClinicalTrialAssistant, args: AskArgs) -> Result<()> {
    let question = args.question.join(" ");
    if question.trim().is_empty() {
        anyhow::bail!("No question provided. Use: trialscribe ask \"Your question here\"");
    }

    let protocol = match &args.protocol {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read protocol file: {}", path.display()))?;
            let protocol: Protocol = serde_json::from_str(&content)
                .with_context(|| format!("Invalid protocol file: {}", path.display()))?;
            Some(protocol)
        }
        None => None,
    };

    let answer = assistant
        .answer_query(&question, protocol.as_ref())
        .await
        .context("Query failed")?;
    println!("{answer}");
    Ok(())
}
