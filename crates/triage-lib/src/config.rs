//! Diagnostic pass configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How issue explanations are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainerMode {
    /// Run an external assistant command, prompt on stdin
    Command,
    /// Fixed offline responses
    Canned,
    /// No explanations
    #[default]
    Disabled,
}

/// Explanation service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainerSettings {
    #[serde(default)]
    pub mode: ExplainerMode,

    /// Assistant binary for `command` mode
    #[serde(default = "default_explainer_command")]
    pub command: String,

    #[serde(default = "default_explainer_args")]
    pub args: Vec<String>,
}

fn default_explainer_command() -> String {
    "amazon-q".to_string()
}

fn default_explainer_args() -> Vec<String> {
    vec!["chat".to_string()]
}

impl Default for ExplainerSettings {
    fn default() -> Self {
        Self {
            mode: ExplainerMode::default(),
            command: default_explainer_command(),
            args: default_explainer_args(),
        }
    }
}

/// Settings for one diagnostic pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Events attached to a single issue
    #[serde(default = "default_max_events")]
    pub max_events: usize,

    /// Warning events kept per namespace
    #[serde(default = "default_max_namespace_events")]
    pub max_namespace_events: usize,

    /// Log lines requested per container
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: i64,

    /// Events older than this are dropped
    #[serde(default = "default_event_max_age_secs")]
    pub event_max_age_secs: i64,

    /// Overall deadline for the pass
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Issues per kind per namespace sent to the explainer
    #[serde(default = "default_max_explained_items")]
    pub max_explained_items: usize,

    /// Also request a suggested fix for explained issues
    #[serde(default)]
    pub generate_fixes: bool,

    /// List namespaces without issues in cluster reports
    #[serde(default)]
    pub include_healthy: bool,

    #[serde(default)]
    pub explainer: ExplainerSettings,
}

fn default_max_events() -> usize {
    20
}

fn default_max_namespace_events() -> usize {
    50
}

fn default_log_tail_lines() -> i64 {
    50
}

fn default_event_max_age_secs() -> i64 {
    3600
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_explained_items() -> usize {
    5
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            max_namespace_events: default_max_namespace_events(),
            log_tail_lines: default_log_tail_lines(),
            event_max_age_secs: default_event_max_age_secs(),
            timeout_secs: default_timeout_secs(),
            max_explained_items: default_max_explained_items(),
            generate_fixes: false,
            include_healthy: false,
            explainer: ExplainerSettings::default(),
        }
    }
}

impl TriageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn event_max_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.event_max_age_secs)
    }
}
