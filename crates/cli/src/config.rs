//! Configuration management for the CLI

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use triage_lib::{ExplainerMode, TriageConfig};

/// Environment variable prefix, e.g. `KTRIAGE_TIMEOUT_SECS`
const ENV_PREFIX: &str = "KTRIAGE";

/// Load the pass configuration.
///
/// Sources, lowest precedence first: the config file (explicit path, or
/// `~/.config/ktriage/config.{toml,yaml,json}` when present), then
/// `KTRIAGE_*` environment variables. Nested keys use a double underscore,
/// e.g. `KTRIAGE_EXPLAINER__MODE=canned`.
pub fn load(path: Option<&Path>) -> Result<TriageConfig> {
    let mut builder = config::Config::builder();

    match path {
        Some(path) => {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        None => {
            if let Some(base) = default_config_base() {
                builder = builder.add_source(
                    config::File::with_name(&base.to_string_lossy()).required(false),
                );
            }
        }
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to load configuration")?;

    settings
        .try_deserialize()
        .context("Failed to parse configuration")
}

/// Config file path without extension
fn default_config_base() -> Option<PathBuf> {
    dirs_next::home_dir().map(|home| home.join(".config").join("ktriage").join("config"))
}

/// Command-line values that take precedence over file and environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub timeout_secs: Option<u64>,
    pub max_explained_items: Option<usize>,
    pub explainer_mode: Option<ExplainerMode>,
    pub generate_fixes: bool,
    pub include_healthy: bool,
}

impl Overrides {
    pub fn apply(self, config: &mut TriageConfig) {
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(max) = self.max_explained_items {
            config.max_explained_items = max;
        }
        if let Some(mode) = self.explainer_mode {
            config.explainer.mode = mode;
        }
        if self.generate_fixes {
            config.generate_fixes = true;
        }
        if self.include_healthy {
            config.include_healthy = true;
        }
    }
}
