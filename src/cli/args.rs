//! CLI argument parsing

use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

/// Draft clinical trial protocols with a chat completion model
#[derive(Parser, Debug)]
#[command(
    name = "trialscribe",
    version,
    about = "Draft clinical trial protocols and answer questions about them\n\nQuick Start:\n  export OPENAI_API_KEY=\"your_key\"\n  trialscribe generate --disease psoriasis --phase 2 --population 200 --duration 12"
)]
pub struct Cli {
    /// Configuration file; defaults to trialscribe.toml discovery from the
    /// current directory
    #[arg(long, global = true, value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Chat completion model, overriding the configuration
    #[arg(long, global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a structured protocol and print it as JSON
    Generate(GenerateArgs),

    /// Ask a question, optionally about a saved protocol
    Ask(AskArgs),

    /// Write a sample trialscribe.toml
    Config {
        #[arg(long, default_value = "trialscribe.toml", value_hint = ValueHint::FilePath)]
        output: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Disease type, e.g. psoriasis
    #[arg(long)]
    pub disease: String,

    /// Study phase (1-4)
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub phase: u8,

    /// Number of patients
    #[arg(long)]
    pub population: u32,

    /// Study duration in weeks
    #[arg(long)]
    pub duration: u32,

    /// Primary endpoint; repeat for several. Defaults to the disease template
    #[arg(long = "endpoint", value_name = "TEXT")]
    pub endpoints: Vec<String>,

    /// Additional criterion as key=value; values that parse as JSON are kept
    /// as JSON
    #[arg(long = "criterion", value_name = "KEY=VALUE", value_parser = parse_criterion)]
    pub criteria: Vec<(String, String)>,

    /// Follow-up question answered against the generated protocol
    #[arg(long)]
    pub ask: Option<String>,

    /// Also write the protocol JSON to this file
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct AskArgs {
    /// The question
    #[arg(required = true)]
    pub question: Vec<String>,

    /// Protocol JSON file used as context
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub protocol: Option<PathBuf>,
}

fn parse_criterion(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("criterion key cannot be empty in `{raw}`"));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
