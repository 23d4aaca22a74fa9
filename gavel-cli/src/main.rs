//! Gavel CLI
//!
//! Command-line collaborator for the execution service: submits a source
//! file or an inline snippet, waits for the verdict, and prints the
//! decoded result.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gavel_session::{CodeRunner, RunnerConfig};

#[derive(Parser)]
#[command(name = "gavel")]
#[command(about = "Run code on a remote execution service", long_about = None)]
struct Cli {
    /// Source file to execute
    file: Option<PathBuf>,

    /// Inline source snippet (takes precedence over FILE)
    #[arg(short, long)]
    code: Option<String>,

    /// Execution service URL
    #[arg(
        long,
        env = "GAVEL_SERVICE_URL",
        default_value = "http://localhost:5000"
    )]
    service_url: String,

    /// Cadence between status queries, in milliseconds
    #[arg(long, default_value_t = 1_000)]
    interval_ms: u64,

    /// Maximum wall-clock time to wait for a result, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    deadline_ms: u64,

    /// Disable base64 transport encoding of stdout/stderr
    #[arg(long)]
    plain: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gavel=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let source = read_source(&cli)?;

    let mut config = RunnerConfig::new(cli.service_url);
    config.poll_interval = Duration::from_millis(cli.interval_ms);
    config.deadline = Duration::from_millis(cli.deadline_ms);
    config.base64_output = !cli.plain;
    config.validate()?;

    info!(
        "Submitting to {} (cadence {:?}, deadline {:?})",
        config.service_url, config.poll_interval, config.deadline
    );

    let runner = Arc::new(CodeRunner::new(config));
    runner.run_code(source);
    runner.wait_idle().await;

    let state = runner.state();
    if !state.error.is_empty() {
        eprintln!("{}", state.error.red());
        return Ok(ExitCode::FAILURE);
    }

    println!("{}", state.output.green());
    Ok(ExitCode::SUCCESS)
}

/// Resolves the snippet to execute from the CLI arguments
fn read_source(cli: &Cli) -> Result<String> {
    if let Some(code) = &cli.code {
        return Ok(code.clone());
    }

    let path = cli
        .file
        .as_ref()
        .context("either FILE or --code is required")?;

    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
