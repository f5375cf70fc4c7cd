//! Kubernetes diagnostic engine
//!
//! This crate provides the core functionality for:
//! - Health classification of pods, deployments and services
//! - Event correlation and container log enrichment
//! - Optional issue explanations through a pluggable assistant
//! - Report assembly under a deadline and rendering per output channel
//!
//! Cluster access lives behind [`ResourceFetcher`], so the engine can be
//! driven by a live API client or by in-memory fixtures.

pub mod classify;
pub mod config;
pub mod enrich;
pub mod error;
pub mod events;
pub mod explain;
pub mod fetch;
pub mod issue;
pub mod observability;
pub mod pipeline;
pub mod prompt;
pub mod records;
pub mod render;
pub mod report;

pub use config::{ExplainerMode, ExplainerSettings, TriageConfig};
pub use error::{format_error, ErrorCategory, ExplainError, FetchError, RenderError};
pub use explain::Explainer;
pub use fetch::{EventQuery, FetchResult, LogRequest, ResourceFetcher};
pub use issue::{ContainerCondition, ContainerIssue, EventSummary, Issue, IssueDetails, ResourceKind};
pub use observability::{StructuredLogger, TriageMetrics};
pub use pipeline::{Diagnostician, KindSelection};
pub use records::*;
pub use render::RenderOptions;
pub use report::{CollectionError, DiagnosticReport, NamespaceReport, ReportStats, Scope};
