//! Free-text error explanation command

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use triage_lib::{prompt, ExplainerMode, ExplainerSettings};

use crate::explainer;

#[derive(Debug, Clone, Default, Args)]
pub struct ExplainArgs {
    /// Error message or YAML to explain
    pub text: Vec<String>,

    /// Read the error message or YAML from a file
    #[arg(long, short = 'f', value_name = "PATH")]
    pub from_file: Option<PathBuf>,
}

/// Pick the text to explain: argument, then file, then piped stdin
pub fn gather_input(
    text: &[String],
    file: Option<&Path>,
    mut stdin: impl Read,
    stdin_is_terminal: bool,
) -> Result<String> {
    let content = if !text.is_empty() {
        text.join(" ")
    } else if let Some(path) = file {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    } else if !stdin_is_terminal {
        let mut buf = String::new();
        stdin
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        buf
    } else {
        String::new()
    };

    if content.trim().is_empty() {
        bail!("No input provided. Pass an error message, use --from-file, or pipe text on stdin");
    }
    Ok(content)
}

/// Explain an error message or manifest through the configured assistant.
///
/// The command exists only to call the assistant, so a disabled explainer
/// falls back to the assistant command.
pub async fn run(args: &ExplainArgs, settings: &ExplainerSettings) -> Result<()> {
    let stdin = std::io::stdin();
    let is_terminal = stdin.is_terminal();
    let content = gather_input(&args.text, args.from_file.as_deref(), stdin.lock(), is_terminal)?;

    let mut settings = settings.clone();
    if settings.mode == ExplainerMode::Disabled {
        settings.mode = ExplainerMode::Command;
    }
    let Some(explainer) = explainer::from_settings(&settings) else {
        bail!("No explanation service configured");
    };

    let analysis = explainer
        .explain(&prompt::error_prompt(&content))
        .await
        .context("Failed to get explanation")?;

    println!("\n{}", "Analysis:".green().bold());
    println!("{}", analysis.trim_end());
    Ok(())
}
