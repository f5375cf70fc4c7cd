//! Issue records produced by the classifiers

use crate::records::{Condition, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Resource kinds the classifiers understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Pod,
    Deployment,
    Service,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::Pod,
        ResourceKind::Deployment,
        ResourceKind::Service,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "Pod",
            ResourceKind::Deployment => "Deployment",
            ResourceKind::Service => "Service",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "Pods",
            ResourceKind::Deployment => "Deployments",
            ResourceKind::Service => "Services",
        }
    }

    /// Heading used when a kind's issues are grouped in a rendering
    pub fn section_title(&self) -> &'static str {
        match self {
            ResourceKind::Pod => "Unhealthy Pods",
            ResourceKind::Deployment => "Misconfigured Deployments",
            ResourceKind::Service => "Service Issues",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived state of a container inside an unhealthy pod
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerCondition {
    Waiting,
    Terminated,
    Running,
    #[serde(rename = "Not Ready")]
    NotReady,
}

impl ContainerCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerCondition::Waiting => "Waiting",
            ContainerCondition::Terminated => "Terminated",
            ContainerCondition::Running => "Running",
            ContainerCondition::NotReady => "Not Ready",
        }
    }
}

impl fmt::Display for ContainerCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-container finding within a pod issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerIssue {
    pub name: String,
    pub ready: bool,
    pub restarts: i32,
    pub status: ContainerCondition,
    pub reason: String,
    pub message: String,
    pub exit_code: Option<i32>,
}

/// Kind-specific detail attached to an issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum IssueDetails {
    Pod {
        node: Option<String>,
        containers: Vec<ContainerIssue>,
    },
    Deployment {
        desired: i32,
        ready: i32,
        updated: i32,
        available: i32,
        strategy: Option<String>,
        /// Conditions whose status is not "True", in listed order
        conditions: Vec<Condition>,
    },
    Service {
        service_type: String,
        endpoint_count: usize,
        selector: Selector,
    },
}

/// Condensed view of a correlated event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub event_type: String,
    pub reason: String,
    pub message: String,
    pub count: i32,
    pub last_seen: Option<String>,
    /// "Kind/name" of the involved object
    pub object: String,
}

/// One unhealthy resource and its diagnostic context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: String,
    pub status: String,
    /// May be empty when no specific condition explains the failure
    pub reason: String,
    pub message: String,
    pub details: IssueDetails,
    pub events: Vec<EventSummary>,
    /// Container name to truncated log tail (pods only)
    pub logs: BTreeMap<String, String>,
    pub explanation: Option<String>,
    pub suggested_fix: Option<String>,
}

impl Issue {
    pub(crate) fn new(
        kind: ResourceKind,
        name: impl Into<String>,
        namespace: impl Into<String>,
        status: impl Into<String>,
        details: IssueDetails,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.into(),
            status: status.into(),
            reason: String::new(),
            message: String::new(),
            details,
            events: Vec::new(),
            logs: BTreeMap::new(),
            explanation: None,
            suggested_fix: None,
        }
    }

    /// Containers listed on a pod issue; empty for other kinds
    pub fn containers(&self) -> &[ContainerIssue] {
        match &self.details {
            IssueDetails::Pod { containers, .. } => containers,
            _ => &[],
        }
    }

    /// Status or replica/endpoint counts, with the reason when set
    pub fn status_summary(&self) -> String {
        let mut line = match &self.details {
            IssueDetails::Deployment { desired, ready, .. } => format!("{}/{} ready", ready, desired),
            IssueDetails::Service { endpoint_count, .. } => format!("{} endpoints", endpoint_count),
            IssueDetails::Pod { .. } => self.status.clone(),
        };
        if !self.reason.is_empty() {
            line.push_str(&format!(" ({})", self.reason));
        }
        line
    }

    /// One-line description used by space-constrained renderings
    pub fn headline(&self) -> String {
        format!("{}: {}", self.name, self.status_summary())
    }
}
