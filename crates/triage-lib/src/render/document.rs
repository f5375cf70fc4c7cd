//! Markdown document rendering

use super::{capped, more_line, RenderOptions, NESTED_ITEM_CAP, NO_ISSUES_MESSAGE, TOP_LEVEL_ITEM_CAP};
use crate::error::RenderError;
use crate::issue::{Issue, IssueDetails, ResourceKind};
use crate::report::{DiagnosticReport, NamespaceReport, ReportStats};
use std::fmt::Write;
use std::path::Path;

/// Render a report as a markdown document
pub fn render_document(report: &DiagnosticReport, options: RenderOptions) -> String {
    let mut out = String::new();
    let stats = report.stats();

    if report.scope.is_cluster() {
        out.push_str("# Kubernetes Cluster Health Report\n\n");
    } else {
        out.push_str("# Kubernetes Diagnostic Report\n\n");
        let _ = writeln!(out, "**Namespace:** {}  ", report.scope_label());
    }
    let _ = writeln!(out, "**Generated:** {}\n", report.generated_at.to_rfc2822());

    if report.partial {
        out.push_str("> **Partial report:** the diagnostic pass hit its deadline before finishing.\n\n");
    }

    write_summary(&mut out, report, &stats);

    if !report.has_issues() {
        let _ = writeln!(out, "{}\n", NO_ISSUES_MESSAGE);
    }
    if let Some(ns) = report.primary_namespace() {
        write_namespace_details(&mut out, ns);
    } else {
        write_cluster_namespaces(&mut out, report, options);
    }

    let errors: Vec<_> = report.collection_errors().collect();
    if !errors.is_empty() {
        out.push_str("## Collection Errors\n\n");
        for error in errors {
            let _ = writeln!(out, "- `{}/{}`: {}", display_ns(&error.namespace), error.section, error.message);
        }
        out.push('\n');
    }

    out
}

/// Render a report and write it to `path`
pub fn write_document(
    report: &DiagnosticReport,
    options: RenderOptions,
    path: &Path,
) -> Result<(), RenderError> {
    std::fs::write(path, render_document(report, options)).map_err(|source| RenderError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn display_ns(namespace: &str) -> &str {
    if namespace.is_empty() {
        "cluster"
    } else {
        namespace
    }
}

fn write_summary(out: &mut String, report: &DiagnosticReport, stats: &ReportStats) {
    out.push_str("## Summary\n\n");
    out.push_str("| Resource | Total | Healthy | Unhealthy |\n");
    out.push_str("|----------|-------|---------|-----------|\n");
    for kind in ResourceKind::ALL {
        let k = stats.kind(kind);
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            kind.plural(),
            k.total,
            k.healthy,
            k.unhealthy
        );
    }
    out.push('\n');
    let _ = writeln!(out, "- **Warning events:** {}", stats.warning_events);
    if report.scope.is_cluster() {
        let _ = writeln!(out, "- **Namespaces:** {}", stats.namespaces);
        let _ = writeln!(out, "- **Namespaces with issues:** {}", stats.namespaces_with_issues);
        let _ = writeln!(out, "- **Cluster health:** {}", stats.verdict());
    }
    out.push('\n');
}

fn write_namespace_details(out: &mut String, ns: &NamespaceReport) {
    for kind in ResourceKind::ALL {
        let issues = ns.issues(kind);
        if issues.is_empty() {
            continue;
        }
        let _ = writeln!(out, "## {}\n", kind.section_title());
        let (shown, remaining) = capped(issues, TOP_LEVEL_ITEM_CAP);
        for issue in shown {
            write_issue(out, issue);
        }
        if remaining > 0 {
            let _ = writeln!(out, "{}\n", more_line(remaining));
        }
    }
    write_warning_events(out, ns);
}

fn write_warning_events(out: &mut String, ns: &NamespaceReport) {
    if !ns.warning_events.is_empty() {
        out.push_str("## Warning Events\n\n");
        out.push_str("| Object | Reason | Count | Message |\n");
        out.push_str("|--------|--------|-------|---------|\n");
        let (shown, remaining) = capped(&ns.warning_events, TOP_LEVEL_ITEM_CAP);
        for e in shown {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                e.object,
                e.reason,
                e.count,
                table_cell(&e.message)
            );
        }
        out.push('\n');
        if remaining > 0 {
            let _ = writeln!(out, "{}\n", more_line(remaining));
        }
    }
}

fn write_issue(out: &mut String, issue: &Issue) {
    let _ = writeln!(out, "### {}\n", issue.name);
    let _ = writeln!(out, "- **Status:** {}", issue.status);
    if !issue.reason.is_empty() {
        let _ = writeln!(out, "- **Reason:** {}", issue.reason);
    }
    if !issue.message.is_empty() {
        let _ = writeln!(out, "- **Message:** {}", issue.message);
    }

    match &issue.details {
        IssueDetails::Pod { node, containers } => {
            if let Some(node) = node {
                let _ = writeln!(out, "- **Node:** {}", node);
            }
            if !containers.is_empty() {
                out.push_str("\n| Container | Ready | Restarts | Status | Reason | Exit Code |\n");
                out.push_str("|-----------|-------|----------|--------|--------|-----------|\n");
                for c in containers {
                    let _ = writeln!(
                        out,
                        "| {} | {} | {} | {} | {} | {} |",
                        c.name,
                        c.ready,
                        c.restarts,
                        c.status,
                        table_cell(&c.reason),
                        c.exit_code.map(|code| code.to_string()).unwrap_or_default()
                    );
                }
            }
        }
        IssueDetails::Deployment {
            desired,
            updated,
            available,
            strategy,
            conditions,
            ..
        } => {
            let _ = writeln!(out, "- **Updated:** {}/{}", updated, desired);
            let _ = writeln!(out, "- **Available:** {}/{}", available, desired);
            if let Some(strategy) = strategy {
                let _ = writeln!(out, "- **Strategy:** {}", strategy);
            }
            for c in conditions {
                let _ = writeln!(
                    out,
                    "- **Condition {}:** {} {}",
                    c.condition_type, c.status, c.reason
                );
            }
        }
        IssueDetails::Service {
            service_type,
            selector,
            ..
        } => {
            let _ = writeln!(out, "- **Type:** {}", service_type);
            let selector = selector
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "- **Selector:** `{}`", selector);
        }
    }

    if !issue.events.is_empty() {
        out.push_str("\n**Recent events:**\n\n");
        for e in &issue.events {
            let _ = writeln!(out, "- {} `{}` (x{}): {}", e.event_type, e.reason, e.count, e.message);
        }
    }

    for (container, logs) in &issue.logs {
        let _ = writeln!(out, "\n**Logs ({}):**\n\n```text\n{}\n```", container, logs.trim_end());
    }

    if let Some(explanation) = &issue.explanation {
        let _ = writeln!(out, "\n**Analysis:**\n\n{}", explanation.trim_end());
    }
    if let Some(fix) = &issue.suggested_fix {
        let _ = writeln!(out, "\n**Suggested fix:**\n\n{}", fix.trim_end());
    }
    out.push('\n');
}

fn write_cluster_namespaces(out: &mut String, report: &DiagnosticReport, options: RenderOptions) {
    let shown: Vec<_> = report
        .namespaces
        .iter()
        .filter(|ns| ns.has_findings() || options.include_healthy)
        .collect();
    if shown.is_empty() {
        return;
    }

    out.push_str("## Namespaces\n\n");
    for ns in shown {
        let _ = writeln!(out, "### {}\n", ns.namespace);
        if !ns.has_issues() {
            out.push_str("No issues.\n\n");
        }
        for kind in ResourceKind::ALL {
            let issues = ns.issues(kind);
            if issues.is_empty() {
                continue;
            }
            let _ = writeln!(out, "**{}:**\n", kind.section_title());
            let (shown, remaining) = capped(issues, NESTED_ITEM_CAP);
            for issue in shown {
                let _ = writeln!(out, "- {}", issue.headline());
            }
            if remaining > 0 {
                let _ = writeln!(out, "- {}", more_line(remaining));
            }
            out.push('\n');
        }
        if !ns.warning_events.is_empty() {
            let _ = writeln!(out, "**Warning events:** {}\n", ns.warning_events.len());
            let (shown, remaining) = capped(&ns.warning_events, NESTED_ITEM_CAP);
            for e in shown {
                let _ = writeln!(out, "- {}: {} (x{})", e.object, e.reason, e.count);
            }
            if remaining > 0 {
                let _ = writeln!(out, "- {}", more_line(remaining));
            }
            out.push('\n');
        }
    }
}

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
