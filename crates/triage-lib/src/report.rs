//! Diagnostic report model
//!
//! A report holds the issues found per namespace and per kind, the
//! namespace-wide warning events, and any sections that could not be
//! collected. Summary statistics are always derived from those lists on
//! demand and never stored.

use crate::issue::{EventSummary, Issue, ResourceKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a diagnostic pass covered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "namespace", rename_all = "snake_case")]
pub enum Scope {
    Namespace(String),
    AllNamespaces,
}

impl Scope {
    pub fn is_cluster(&self) -> bool {
        matches!(self, Scope::AllNamespaces)
    }
}

/// Part of a namespace that is collected independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    Namespaces,
    Pods,
    Deployments,
    Services,
    Events,
}

impl ReportSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportSection::Namespaces => "namespaces",
            ReportSection::Pods => "pods",
            ReportSection::Deployments => "deployments",
            ReportSection::Services => "services",
            ReportSection::Events => "events",
        }
    }
}

impl From<ResourceKind> for ReportSection {
    fn from(kind: ResourceKind) -> Self {
        match kind {
            ResourceKind::Pod => ReportSection::Pods,
            ResourceKind::Deployment => ReportSection::Deployments,
            ResourceKind::Service => ReportSection::Services,
        }
    }
}

impl fmt::Display for ReportSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A section that could not be collected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionError {
    /// Empty for cluster-wide sections such as the namespace listing
    pub namespace: String,
    pub section: ReportSection,
    pub message: String,
}

impl fmt::Display for CollectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}: {}", self.section, self.message)
        } else {
            write!(f, "{}/{}: {}", self.namespace, self.section, self.message)
        }
    }
}

/// Issues found for one kind, plus how many resources were classified
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindSection {
    /// Resources classified; skipped resources are not counted
    pub checked: usize,
    /// Issues in fetch order
    pub issues: Vec<Issue>,
}

/// Findings for a single namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceReport {
    pub namespace: String,
    pub pods: KindSection,
    pub deployments: KindSection,
    pub services: KindSection,
    pub warning_events: Vec<EventSummary>,
    pub errors: Vec<CollectionError>,
}

impl NamespaceReport {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            pods: KindSection::default(),
            deployments: KindSection::default(),
            services: KindSection::default(),
            warning_events: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn section(&self, kind: ResourceKind) -> &KindSection {
        match kind {
            ResourceKind::Pod => &self.pods,
            ResourceKind::Deployment => &self.deployments,
            ResourceKind::Service => &self.services,
        }
    }

    pub fn section_mut(&mut self, kind: ResourceKind) -> &mut KindSection {
        match kind {
            ResourceKind::Pod => &mut self.pods,
            ResourceKind::Deployment => &mut self.deployments,
            ResourceKind::Service => &mut self.services,
        }
    }

    pub fn issues(&self, kind: ResourceKind) -> &[Issue] {
        &self.section(kind).issues
    }

    pub fn issue_count(&self) -> usize {
        ResourceKind::ALL.iter().map(|k| self.issues(*k).len()).sum()
    }

    /// True when any per-kind issue list is non-empty
    pub fn has_issues(&self) -> bool {
        self.issue_count() > 0
    }

    /// True when the namespace has issues or warning events to show
    pub fn has_findings(&self) -> bool {
        self.has_issues() || !self.warning_events.is_empty()
    }

    pub fn record_error(&mut self, section: ReportSection, message: impl Into<String>) {
        self.errors.push(CollectionError {
            namespace: self.namespace.clone(),
            section,
            message: message.into(),
        });
    }
}

/// Healthy/unhealthy counts for one kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindStats {
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
}

impl KindStats {
    fn add(&mut self, section: &KindSection) {
        let unhealthy = section.issues.len();
        self.total += section.checked.max(unhealthy);
        self.unhealthy += unhealthy;
        self.healthy += section.checked.saturating_sub(unhealthy);
    }
}

/// Summary statistics derived from a report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStats {
    pub pods: KindStats,
    pub deployments: KindStats,
    pub services: KindStats,
    pub namespaces: usize,
    pub namespaces_with_issues: usize,
    pub warning_events: usize,
}

impl ReportStats {
    pub fn kind(&self, kind: ResourceKind) -> &KindStats {
        match kind {
            ResourceKind::Pod => &self.pods,
            ResourceKind::Deployment => &self.deployments,
            ResourceKind::Service => &self.services,
        }
    }

    pub fn total_issues(&self) -> usize {
        self.pods.unhealthy + self.deployments.unhealthy + self.services.unhealthy
    }

    /// Overall verdict label
    pub fn verdict(&self) -> &'static str {
        if self.total_issues() == 0 {
            "Healthy"
        } else {
            "Unhealthy"
        }
    }
}

/// Result of one diagnostic pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub generated_at: DateTime<Utc>,
    pub scope: Scope,
    /// Namespaces in processing order
    pub namespaces: Vec<NamespaceReport>,
    /// Failures not tied to a namespace
    pub errors: Vec<CollectionError>,
    /// Set when the pass hit its deadline before finishing
    pub partial: bool,
}

impl DiagnosticReport {
    pub fn new(scope: Scope, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            scope,
            namespaces: Vec::new(),
            errors: Vec::new(),
            partial: false,
        }
    }

    /// Recompute summary statistics from the issue lists
    pub fn stats(&self) -> ReportStats {
        let mut stats = ReportStats::default();
        for ns in &self.namespaces {
            stats.pods.add(&ns.pods);
            stats.deployments.add(&ns.deployments);
            stats.services.add(&ns.services);
            stats.warning_events += ns.warning_events.len();
            if ns.has_issues() {
                stats.namespaces_with_issues += 1;
            }
        }
        stats.namespaces = self.namespaces.len();
        stats
    }

    /// True when any namespace has a non-empty issue list
    pub fn has_issues(&self) -> bool {
        self.namespaces.iter().any(NamespaceReport::has_issues)
    }

    /// All issues of one kind across namespaces, in report order
    pub fn issues(&self, kind: ResourceKind) -> impl Iterator<Item = &Issue> + '_ {
        self.namespaces.iter().flat_map(move |ns| ns.issues(kind).iter())
    }

    /// Every collection failure, cluster-wide ones first
    pub fn collection_errors(&self) -> impl Iterator<Item = &CollectionError> + '_ {
        self.errors
            .iter()
            .chain(self.namespaces.iter().flat_map(|ns| ns.errors.iter()))
    }

    /// The single namespace of a namespace-scoped report
    pub fn primary_namespace(&self) -> Option<&NamespaceReport> {
        match self.scope {
            Scope::Namespace(_) => self.namespaces.first(),
            Scope::AllNamespaces => None,
        }
    }

    /// Label for the report's scope
    pub fn scope_label(&self) -> String {
        match &self.scope {
            Scope::Namespace(ns) => ns.clone(),
            Scope::AllNamespaces => "all namespaces".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueDetails;

    fn pod_issue(name: &str, ns: &str) -> Issue {
        Issue::new(
            ResourceKind::Pod,
            name,
            ns,
            "Pending",
            IssueDetails::Pod {
                node: None,
                containers: vec![],
            },
        )
    }

    #[test]
    fn test_stats_derived_from_sections() {
        let mut report = DiagnosticReport::new(Scope::AllNamespaces, Utc::now());

        let mut a = NamespaceReport::new("a");
        a.pods.checked = 4;
        a.pods.issues = vec![pod_issue("p1", "a")];
        a.services.checked = 2;
        report.namespaces.push(a);

        let mut b = NamespaceReport::new("b");
        b.pods.checked = 3;
        b.deployments.checked = 1;
        report.namespaces.push(b);

        let stats = report.stats();
        assert_eq!(
            stats.pods,
            KindStats {
                total: 7,
                healthy: 6,
                unhealthy: 1
            }
        );
        assert_eq!(stats.services.healthy, 2);
        assert_eq!(stats.deployments.total, 1);
        assert_eq!(stats.namespaces, 2);
        assert_eq!(stats.namespaces_with_issues, 1);
        assert_eq!(stats.verdict(), "Unhealthy");
        assert!(report.has_issues());
    }

    #[test]
    fn test_stats_follow_mutation() {
        let mut report = DiagnosticReport::new(Scope::Namespace("a".into()), Utc::now());
        let mut ns = NamespaceReport::new("a");
        ns.pods.checked = 1;
        report.namespaces.push(ns);
        assert_eq!(report.stats().verdict(), "Healthy");

        report.namespaces[0].pods.issues.push(pod_issue("p1", "a"));
        assert_eq!(report.stats().pods.unhealthy, 1);
        assert_eq!(report.stats().pods.healthy, 0);
    }

    #[test]
    fn test_errors_do_not_count_as_issues() {
        let mut report = DiagnosticReport::new(Scope::Namespace("a".into()), Utc::now());
        let mut ns = NamespaceReport::new("a");
        ns.record_error(ReportSection::Pods, "forbidden");
        report.namespaces.push(ns);

        assert!(!report.has_issues());
        let errors: Vec<_> = report.collection_errors().collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "a/pods: forbidden");
    }

    #[test]
    fn test_primary_namespace_only_for_namespace_scope() {
        let mut report = DiagnosticReport::new(Scope::AllNamespaces, Utc::now());
        report.namespaces.push(NamespaceReport::new("a"));
        assert!(report.primary_namespace().is_none());
        assert_eq!(report.scope_label(), "all namespaces");
    }
}
