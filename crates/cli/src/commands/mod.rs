//! Subcommand implementations

pub mod diagnose;
pub mod explain;
pub mod report;

use crate::output::{Destination, OutputFormat};
use std::path::PathBuf;
use triage_lib::render::RenderOptions;
use triage_lib::TriageConfig;

/// Settings shared by every command in one invocation
pub struct Session {
    pub config: TriageConfig,
    pub format: OutputFormat,
    pub file: Option<PathBuf>,
    pub webhook: Option<String>,
}

impl Session {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            include_healthy: self.config.include_healthy,
        }
    }

    pub fn destination(&self) -> Destination<'_> {
        Destination {
            file: self.file.as_deref(),
            webhook: self.webhook.as_deref(),
        }
    }

    /// Progress chatter only goes to interactive terminal output
    pub fn is_interactive(&self) -> bool {
        self.format == OutputFormat::Terminal
    }
}
