//! Output formatting and delivery

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use std::path::Path;
use triage_lib::render::{self, RenderOptions};
use triage_lib::{format_error, DiagnosticReport, ErrorCategory};

use crate::client::WebhookClient;

/// Output channel for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored terminal output (default)
    #[default]
    Terminal,
    /// Markdown document
    Markdown,
    /// Chat webhook message
    Slack,
    /// JSON document
    Json,
}

/// Where a rendered report goes besides stdout
#[derive(Debug, Default)]
pub struct Destination<'a> {
    pub file: Option<&'a Path>,
    pub webhook: Option<&'a str>,
}

/// Render a report in the requested format and deliver it.
///
/// Terminal output always goes to stdout. Markdown and JSON go to the file
/// when one is given, otherwise to stdout. Slack requires a webhook URL.
pub async fn emit_report(
    report: &DiagnosticReport,
    format: OutputFormat,
    options: RenderOptions,
    destination: Destination<'_>,
) -> Result<()> {
    match format {
        OutputFormat::Terminal => {
            print!("{}", render::render_console(report, options));
            if let Some(path) = destination.file {
                render::write_document(report, options, path)?;
                print_success(&format!("Report written to {}", path.display()));
            }
        }
        OutputFormat::Markdown => match destination.file {
            Some(path) => {
                render::write_document(report, options, path)?;
                print_success(&format!("Report written to {}", path.display()));
            }
            None => print!("{}", render::render_document(report, options)),
        },
        OutputFormat::Json => {
            let json = render::render_json(report)?;
            match destination.file {
                Some(path) => {
                    std::fs::write(path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    print_success(&format!("Report written to {}", path.display()));
                }
                None => println!("{}", json),
            }
        }
        OutputFormat::Slack => {
            let Some(url) = destination.webhook else {
                bail!("Slack output requires --slack-webhook (or KTRIAGE_SLACK_WEBHOOK)");
            };
            let payload = render::render_webhook(report, options);
            WebhookClient::new(url)?.send(&payload).await?;
            print_success("Report sent to Slack");
        }
    }

    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a categorised error with a remediation hint
pub fn print_error(message: &str) {
    let category = ErrorCategory::detect(message);
    eprintln!("{} {}", "✗".red().bold(), format_error(message).red());
    eprintln!("  {}", category.hint(message).yellow());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}
