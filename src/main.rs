//! Logwarden - Main Entry Point

use clap::Parser;
use logwarden::cli::{cmd_analyze, cmd_fit, cmd_serve, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logwarden=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fit { corpus, output } => cmd_fit(&corpus, &output)?,
        Commands::Analyze { model, logfile } => cmd_analyze(&model, &logfile)?,
        Commands::Serve { host, port, model } => cmd_serve(&host, port, &model).await?,
    }

    Ok(())
}
