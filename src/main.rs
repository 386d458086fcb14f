//! TrialScribe - clinical trial protocol drafting from the command line

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;
use trialscribe_core::TrialScribeConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    match args.command {
        Commands::Config { output } => {
            TrialScribeConfig::create_sample_config(&output)?;
            println!("Wrote sample configuration to {}", output.display());
        }
        Commands::Generate(generate) => {
            let assistant = cli::load_assistant(args.config.as_deref(), args.model.as_deref())?;
            cli::handle_generate_command(&assistant, generate).await?;
        }
        Commands::Ask(ask) => {
            let assistant = cli::load_assistant(args.config.as_deref(), args.model.as_deref())?;
            cli::handle_ask_command(&assistant, ask).await?;
        }
    }

    Ok(())
}
