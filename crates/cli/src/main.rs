//! Kubernetes triage CLI
//!
//! Finds unhealthy pods, deployments and services, correlates the events
//! and logs that explain them, and reports to the terminal, a markdown
//! file, a chat webhook or JSON.

mod client;
mod commands;
mod config;
mod explainer;
mod kube_fetcher;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use commands::{diagnose, explain, report, Session};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use triage_lib::{ExplainerMode, ResourceFetcher};

/// Kubernetes triage CLI
#[derive(Parser)]
#[command(name = "ktriage")]
#[command(author, version, about = "Diagnose unhealthy Kubernetes workloads", long_about = None)]
pub struct Cli {
    /// Path to kubeconfig file (uses KUBECONFIG or ~/.kube/config if not specified)
    #[arg(long, global = true, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Namespace to inspect (defaults to the kubeconfig context's namespace)
    #[arg(long, short, global = true)]
    pub namespace: Option<String>,

    /// Output format
    #[arg(long, short, value_enum, default_value = "terminal", global = true)]
    pub output: output::OutputFormat,

    /// Slack incoming webhook URL for slack output
    #[arg(long, env = "KTRIAGE_SLACK_WEBHOOK", global = true)]
    pub slack_webhook: Option<String>,

    /// Write the report to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Configuration file (toml, yaml or json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Explanation service to use
    #[arg(long, value_enum, global = true)]
    pub explainer: Option<ExplainerChoice>,

    /// Also request suggested fixes for explained issues
    #[arg(long, global = true)]
    pub fix: bool,

    /// Overall deadline for a diagnostic pass, in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Diagnose issues in a namespace
    Diagnose(diagnose::DiagnoseArgs),

    /// Generate a health report for a namespace or the whole cluster
    Report(report::ReportArgs),

    /// Explain a Kubernetes error message or YAML manifest
    Explain(explain::ExplainArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExplainerChoice {
    /// External assistant command
    Command,
    /// Offline canned responses
    Canned,
    /// No explanations
    Disabled,
}

impl From<ExplainerChoice> for ExplainerMode {
    fn from(choice: ExplainerChoice) -> Self {
        match choice {
            ExplainerChoice::Command => ExplainerMode::Command,
            ExplainerChoice::Canned => ExplainerMode::Canned,
            ExplainerChoice::Disabled => ExplainerMode::Disabled,
        }
    }
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = config::load(cli.config.as_deref())?;

    let (max_items, include_healthy) = match &cli.command {
        Commands::Diagnose(args) => (args.max_items, false),
        Commands::Report(args) => (None, args.include_healthy),
        Commands::Explain(_) => (None, false),
    };
    config::Overrides {
        timeout_secs: cli.timeout,
        max_explained_items: max_items,
        explainer_mode: cli.explainer.map(Into::into),
        generate_fixes: cli.fix,
        include_healthy,
    }
    .apply(&mut config);
    debug!(?config, "Configuration loaded");

    if let Commands::Explain(args) = &cli.command {
        return explain::run(args, &config.explainer).await;
    }

    let fetcher: Arc<dyn ResourceFetcher> =
        Arc::new(kube_fetcher::KubeFetcher::connect(cli.kubeconfig.as_deref()).await?);

    let session = Session {
        config,
        format: cli.output,
        file: cli.file,
        webhook: cli.slack_webhook,
    };

    match cli.command {
        Commands::Diagnose(args) => diagnose::run(fetcher, cli.namespace, &args, &session).await,
        Commands::Report(args) => report::run(fetcher, cli.namespace, &args, &session).await,
        Commands::Explain(_) => Ok(()),
    }
}
