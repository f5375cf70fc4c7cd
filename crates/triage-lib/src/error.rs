//! Error types for collaborators and renderers

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by a [`ResourceFetcher`](crate::fetch::ResourceFetcher)
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request never produced a listing (network, auth, API server)
    #[error("transport error: {0}")]
    Transport(String),

    /// The named object does not exist
    #[error("{kind} {name} not found")]
    NotFound { kind: String, name: String },

    /// The upstream answered with something that could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }
}

/// Errors returned by an [`Explainer`](crate::explain::Explainer)
#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("explanation service unavailable: {0}")]
    Unavailable(String),

    #[error("explanation service failed: {0}")]
    Failed(String),

    #[error("explanation service returned an empty response")]
    Empty,
}

/// Errors writing a rendered report
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write report to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Coarse category of a user-facing error, detected by keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Permission,
    NotFound,
    Connection,
    Configuration,
    Resource,
    Unknown,
}

const PERMISSION_KEYWORDS: &[&str] = &[
    "forbidden",
    "unauthorized",
    "permission denied",
    "cannot get",
    "cannot list",
    "cannot create",
    "cannot update",
    "cannot delete",
];
const NOT_FOUND_KEYWORDS: &[&str] = &["not found", "no such", "doesn't exist", "does not exist"];
const CONNECTION_KEYWORDS: &[&str] = &[
    "connection",
    "dial",
    "timeout",
    "refused",
    "unreachable",
    "network",
];
const CONFIGURATION_KEYWORDS: &[&str] = &["configuration", "config", "invalid", "missing", "required"];
const RESOURCE_KEYWORDS: &[&str] = &["resource", "quota", "limit", "insufficient", "exceeded"];

impl ErrorCategory {
    /// Detect the category from a message; checks run in a fixed order
    pub fn detect(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

        if has_any(PERMISSION_KEYWORDS) {
            ErrorCategory::Permission
        } else if has_any(NOT_FOUND_KEYWORDS) {
            ErrorCategory::NotFound
        } else if has_any(CONNECTION_KEYWORDS) {
            ErrorCategory::Connection
        } else if has_any(CONFIGURATION_KEYWORDS) {
            ErrorCategory::Configuration
        } else if has_any(RESOURCE_KEYWORDS) {
            ErrorCategory::Resource
        } else {
            ErrorCategory::Unknown
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::Permission => "Permission Error",
            ErrorCategory::NotFound => "Not Found Error",
            ErrorCategory::Connection => "Connection Error",
            ErrorCategory::Configuration => "Configuration Error",
            ErrorCategory::Resource => "Resource Error",
            ErrorCategory::Unknown => "Error",
        }
    }

    /// Generic remediation hint for the category, refined by keywords
    pub fn hint(&self, message: &str) -> &'static str {
        let lower = message.to_lowercase();
        match self {
            ErrorCategory::Permission if lower.contains("serviceaccount") => {
                "This appears to be a permissions issue with your service account. Create a Role or ClusterRole with the necessary permissions and bind it to the service account."
            }
            ErrorCategory::Permission => {
                "This appears to be a permissions issue. Check that you have the necessary RBAC permissions to perform this action."
            }
            ErrorCategory::NotFound if lower.contains("pod") => {
                "The pod was not found. Check that it exists in the correct namespace and has not been deleted."
            }
            ErrorCategory::NotFound if lower.contains("service") => {
                "The service was not found. Check that it exists in the correct namespace and has not been deleted."
            }
            ErrorCategory::NotFound => {
                "The resource was not found. Check that it exists in the correct namespace and has not been deleted."
            }
            ErrorCategory::Connection if lower.contains("refused") => {
                "Connection was refused. Check that the Kubernetes API server is running and reachable."
            }
            ErrorCategory::Connection => {
                "This appears to be a connection issue. Check network connectivity to the Kubernetes API server."
            }
            ErrorCategory::Configuration if lower.contains("kubeconfig") => {
                "There seems to be an issue with your kubeconfig file. Make sure it exists and is properly configured."
            }
            ErrorCategory::Configuration => {
                "This appears to be a configuration issue. Check your configuration files and environment variables."
            }
            ErrorCategory::Resource if lower.contains("memory") => {
                "There are insufficient memory resources. Consider raising the memory limit or lowering the request."
            }
            ErrorCategory::Resource if lower.contains("cpu") => {
                "There are insufficient CPU resources. Consider raising the CPU limit or lowering the request."
            }
            ErrorCategory::Resource => {
                "This appears to be a resource issue. Check your resource quotas and limits."
            }
            ErrorCategory::Unknown => "No specific fix suggestion available for this error.",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Prefix a message with its detected category label
pub fn format_error(message: &str) -> String {
    format!("{}: {}", ErrorCategory::detect(message), message)
}
