//! Report renderers
//!
//! Every renderer consumes the same [`DiagnosticReport`] and agrees on three
//! things: issues appear in report order, space-constrained channels cap each
//! category and close it with a single "... and K more" line, and a report
//! without issues renders the shared [`NO_ISSUES_MESSAGE`] instead of any
//! category section.

mod console;
mod document;
mod webhook;

pub use console::render_console;
pub use document::{render_document, write_document};
pub use webhook::{render_webhook, Attachment, Block, TextObject, WebhookPayload};

use crate::error::RenderError;
use crate::report::{DiagnosticReport, ReportStats};
use serde::Serialize;

/// Items shown per category in top-level grouped summaries
pub const TOP_LEVEL_ITEM_CAP: usize = 5;

/// Items shown per category in nested per-namespace summaries
pub const NESTED_ITEM_CAP: usize = 3;

/// Shown when every per-kind issue list is empty
pub const NO_ISSUES_MESSAGE: &str = "No issues found. All checked resources are healthy.";

/// Rendering switches shared by all channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// List namespaces without issues in cluster renderings
    pub include_healthy: bool,
}

/// Split a list into the items to show and the count left over
pub fn capped<T>(items: &[T], cap: usize) -> (&[T], usize) {
    if items.len() > cap {
        (&items[..cap], items.len() - cap)
    } else {
        (items, 0)
    }
}

/// The line that replaces items beyond a cap
pub fn more_line(remaining: usize) -> String {
    format!("... and {} more", remaining)
}

/// Serialize a report together with its derived statistics
pub fn render_json(report: &DiagnosticReport) -> Result<String, RenderError> {
    #[derive(Serialize)]
    struct JsonReport<'a> {
        #[serde(flatten)]
        report: &'a DiagnosticReport,
        stats: ReportStats,
    }

    Ok(serde_json::to_string_pretty(&JsonReport {
        report,
        stats: report.stats(),
    })?)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::classify::{classify_deployment, classify_pod};
    use crate::issue::{EventSummary, Issue};
    use crate::records::*;
    use crate::report::{DiagnosticReport, NamespaceReport, Scope};
    use chrono::{TimeZone, Utc};

    pub fn pod_issue(name: &str, ns: &str) -> Issue {
        let pod = PodRecord {
            name: name.to_string(),
            namespace: ns.to_string(),
            phase: PodPhase::Running,
            node_name: Some("node-1".to_string()),
            conditions: vec![],
            container_statuses: vec![ContainerStatusRecord {
                name: "app".to_string(),
                image: "app:1".to_string(),
                ready: false,
                restart_count: 3,
                state: ContainerState::Waiting {
                    reason: "CrashLoopBackOff".to_string(),
                    message: "back-off restarting".to_string(),
                },
                last_termination: None,
            }],
        };
        classify_pod(&pod).expect("crashing pod is unhealthy")
    }

    pub fn deployment_issue(name: &str, ns: &str) -> Issue {
        let deployment = DeploymentRecord {
            name: name.to_string(),
            namespace: ns.to_string(),
            desired_replicas: 5,
            ready_replicas: 2,
            updated_replicas: 5,
            available_replicas: 2,
            strategy: Some("RollingUpdate".to_string()),
            conditions: vec![],
        };
        classify_deployment(&deployment).expect("short deployment is unhealthy")
    }

    pub fn namespace(name: &str, pods: usize) -> NamespaceReport {
        let mut ns = NamespaceReport::new(name);
        ns.pods.checked = pods + 1;
        ns.pods.issues = (0..pods)
            .map(|i| pod_issue(&format!("web-{}", i), name))
            .collect();
        ns
    }

    /// Add `count` FailedMount warnings on job pods
    pub fn with_events(mut ns: NamespaceReport, count: usize) -> NamespaceReport {
        ns.warning_events = (0..count)
            .map(|i| EventSummary {
                event_type: "Warning".to_string(),
                reason: "FailedMount".to_string(),
                message: "MountVolume.SetUp failed for volume \"config\"".to_string(),
                count: 2,
                last_seen: Some("2024-05-01T11:55:00Z".to_string()),
                object: format!("Pod/job-{}", i),
            })
            .collect();
        ns
    }

    pub fn report(scope: Scope, namespaces: Vec<NamespaceReport>) -> DiagnosticReport {
        let mut report =
            DiagnosticReport::new(scope, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        report.namespaces = namespaces;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Scope;

    #[test]
    fn test_capped() {
        let items = [1, 2, 3, 4, 5, 6, 7, 8];
        let (shown, rest) = capped(&items, TOP_LEVEL_ITEM_CAP);
        assert_eq!(shown, &[1, 2, 3, 4, 5]);
        assert_eq!(rest, 3);

        let (shown, rest) = capped(&items[..2], NESTED_ITEM_CAP);
        assert_eq!(shown.len(), 2);
        assert_eq!(rest, 0);
        assert_eq!(more_line(3), "... and 3 more");
    }

    #[test]
    fn test_json_includes_stats() {
        let report = fixtures::report(
            Scope::Namespace("shop".to_string()),
            vec![fixtures::namespace("shop", 2)],
        );
        let json = render_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["stats"]["pods"]["unhealthy"], 2);
        assert_eq!(value["stats"]["pods"]["total"], 3);
        assert_eq!(value["namespaces"][0]["pods"]["issues"][0]["name"], "web-0");
        assert_eq!(value["partial"], false);
    }
}
