//! Command-line interface

use crate::analyzer::analyze_lines;
use crate::bundle::ModelBundle;
use crate::server::{run_server, ServerConfig};
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::info;

#[derive(Parser)]
#[command(name = "logwarden", about = "SOC-grade access-log anomaly triage")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit the model bundle on a corpus of known-normal log lines
    Fit {
        /// File with one normal log line per row
        #[arg(long)]
        corpus: String,
        /// Where to write the fitted artifact
        #[arg(long, default_value = "./models/logwarden.bundle")]
        output: String,
    },
    /// Analyze a log file with a fitted bundle and print JSON findings
    Analyze {
        /// Path to the fitted artifact
        #[arg(long, default_value = "./models/logwarden.bundle")]
        model: String,
        /// Log file to triage
        logfile: String,
    },
    /// Run the HTTP server
    Serve {
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Path to the fitted artifact
        #[arg(long, default_value = "./models/logwarden.bundle")]
        model: String,
    },
}

pub fn cmd_fit(corpus_path: &str, output: &str) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(corpus_path)?;
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    info!(corpus = %corpus_path, lines = lines.len(), "Fitting model bundle");

    let mut bundle = ModelBundle::new();
    bundle.fit(&lines)?;

    if let Some(parent) = Path::new(output).parent() {
        std::fs::create_dir_all(parent)?;
    }
    bundle.save(output)?;
    Ok(())
}

pub fn cmd_analyze(model: &str, logfile: &str) -> anyhow::Result<()> {
    let bundle = ModelBundle::load(model)?;
    let text = std::fs::read_to_string(logfile)?;
    let lines: Vec<String> = text.lines().map(|l| l.to_string()).collect();

    let findings = analyze_lines(&bundle, &lines)?;
    println!("{}", serde_json::to_string_pretty(&findings)?);
    Ok(())
}

pub async fn cmd_serve(host: &str, port: u16, model: &str) -> anyhow::Result<()> {
    let config = ServerConfig {
        host: host.to_string(),
        port,
        model_path: model.to_string(),
    };
    run_server(config).await
}
