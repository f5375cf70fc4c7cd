//! Console rendering

use super::{RenderOptions, NO_ISSUES_MESSAGE};
use crate::issue::{Issue, IssueDetails, ResourceKind};
use crate::report::{DiagnosticReport, KindStats, NamespaceReport, ReportStats};
use colored::Colorize;
use std::fmt::Write;

/// Prefix for detail lines under an issue
const DETAIL_INDENT: &str = "    ";
/// Prefix for reflowed explanation and fix text
const TEXT_INDENT: &str = "        ";

/// Render a report for an interactive terminal.
///
/// The console is not space-constrained, so nothing is capped.
pub fn render_console(report: &DiagnosticReport, options: RenderOptions) -> String {
    let mut out = String::new();
    let stats = report.stats();

    let title = if report.scope.is_cluster() {
        "Kubernetes Cluster Health Report".to_string()
    } else {
        format!("Diagnostic Results for Namespace: {}", report.scope_label())
    };
    let _ = writeln!(out, "\n{}", title.cyan().bold());
    let _ = writeln!(
        out,
        "{}",
        format!("Time: {}", report.generated_at.to_rfc2822()).cyan()
    );
    if report.partial {
        let _ = writeln!(
            out,
            "{}",
            "Deadline reached; showing partial results".yellow().bold()
        );
    }
    out.push('\n');

    write_summary(&mut out, report, &stats);

    if !report.has_issues() {
        let _ = writeln!(out, "{} {}\n", "✓".green().bold(), NO_ISSUES_MESSAGE.green());
    }
    if let Some(ns) = report.primary_namespace() {
        write_namespace_details(&mut out, ns);
    } else {
        for ns in &report.namespaces {
            if !ns.has_findings() && !options.include_healthy {
                continue;
            }
            let _ = writeln!(out, "{}", format!("Namespace: {}", ns.namespace).blue().bold());
            if !ns.has_issues() {
                let _ = writeln!(out, "{}{}\n", DETAIL_INDENT, "No issues".green());
            }
            write_namespace_details(&mut out, ns);
        }
    }

    write_collection_errors(&mut out, report);
    out
}

fn write_summary(out: &mut String, report: &DiagnosticReport, stats: &ReportStats) {
    let _ = writeln!(out, "{}", "Summary:".bold());
    if report.scope.is_cluster() {
        let _ = writeln!(out, "- Namespaces: {}", stats.namespaces);
    }
    for kind in ResourceKind::ALL {
        let _ = writeln!(out, "- {}", kind_summary(kind, stats.kind(kind)));
    }
    let _ = writeln!(out, "- Warning Events: {}", stats.warning_events);
    if report.scope.is_cluster() {
        let verdict = stats.verdict();
        let colored_verdict = if stats.total_issues() == 0 {
            verdict.green().bold()
        } else {
            verdict.red().bold()
        };
        let _ = writeln!(out, "- Cluster Health: {}", colored_verdict);
    }
    out.push('\n');
}

fn kind_summary(kind: ResourceKind, stats: &KindStats) -> String {
    format!(
        "{}: {} total ({} healthy, {} unhealthy)",
        kind.plural(),
        stats.total,
        stats.healthy,
        stats.unhealthy
    )
}

fn write_namespace_details(out: &mut String, ns: &NamespaceReport) {
    for kind in ResourceKind::ALL {
        let issues = ns.issues(kind);
        if issues.is_empty() {
            continue;
        }
        let _ = writeln!(out, "{}", format!("{}:", kind.section_title()).yellow().bold());
        for (i, issue) in issues.iter().enumerate() {
            write_issue(out, i + 1, issue);
        }
        out.push('\n');
    }

    if !ns.warning_events.is_empty() {
        let _ = writeln!(out, "{}", "Warning Events:".yellow().bold());
        for event in &ns.warning_events {
            let _ = writeln!(
                out,
                "- {} {} (x{}): {}",
                event.object.bold(),
                event.reason,
                event.count,
                event.message
            );
        }
        out.push('\n');
    }
}

fn write_issue(out: &mut String, index: usize, issue: &Issue) {
    let _ = writeln!(
        out,
        "{}",
        format!("\n[{}] {}: {}", index, issue.kind, issue.name).yellow()
    );

    match &issue.details {
        IssueDetails::Pod { node, containers } => {
            let _ = writeln!(out, "{}Status: {}", DETAIL_INDENT, color_status(&issue.status));
            if let Some(node) = node {
                let _ = writeln!(out, "{}Node: {}", DETAIL_INDENT, node);
            }
            write_reason(out, issue);
            if !containers.is_empty() {
                let _ = writeln!(out, "{}Container Issues:", DETAIL_INDENT);
                for c in containers {
                    let _ = write!(out, "{}- {}: {}", DETAIL_INDENT, c.name, c.status);
                    if c.restarts > 0 {
                        let _ = write!(out, " (Restarts: {})", c.restarts);
                    }
                    if let Some(code) = c.exit_code {
                        let _ = write!(out, " (Exit code: {})", code);
                    }
                    out.push('\n');
                    if !c.reason.is_empty() {
                        let _ = writeln!(out, "{}  Reason: {}", DETAIL_INDENT, c.reason);
                    }
                    if !c.message.is_empty() {
                        let _ = writeln!(out, "{}  Message: {}", DETAIL_INDENT, c.message);
                    }
                }
            }
        }
        IssueDetails::Deployment {
            desired,
            ready,
            updated,
            available,
            ..
        } => {
            let _ = writeln!(out, "{}Replicas: {}/{} ready", DETAIL_INDENT, ready, desired);
            let _ = writeln!(
                out,
                "{}Updated: {}/{}, Available: {}/{}",
                DETAIL_INDENT, updated, desired, available, desired
            );
            write_reason(out, issue);
        }
        IssueDetails::Service {
            service_type,
            endpoint_count,
            ..
        } => {
            let _ = writeln!(out, "{}Type: {}", DETAIL_INDENT, service_type);
            let _ = writeln!(out, "{}Endpoints: {}", DETAIL_INDENT, endpoint_count);
            write_reason(out, issue);
        }
    }

    if !issue.events.is_empty() {
        let _ = writeln!(out, "{}Events:", DETAIL_INDENT);
        for e in &issue.events {
            let _ = writeln!(
                out,
                "{}- {} {} (x{}): {}",
                DETAIL_INDENT, e.event_type, e.reason, e.count, e.message
            );
        }
    }

    for (container, logs) in &issue.logs {
        let _ = writeln!(out, "{}Logs ({}):", DETAIL_INDENT, container);
        let _ = writeln!(out, "{}", reflow(logs, TEXT_INDENT).dimmed());
    }

    if let Some(explanation) = &issue.explanation {
        let _ = writeln!(out, "\n{}{}", DETAIL_INDENT, "Analysis:".green().bold());
        let _ = writeln!(out, "{}", reflow(explanation, TEXT_INDENT));
    }
    if let Some(fix) = &issue.suggested_fix {
        let _ = writeln!(out, "\n{}{}", DETAIL_INDENT, "Suggested Fix:".cyan().bold());
        let _ = writeln!(out, "{}", reflow(fix, TEXT_INDENT));
    }
}

fn write_reason(out: &mut String, issue: &Issue) {
    if !issue.reason.is_empty() {
        let _ = writeln!(out, "{}Reason: {}", DETAIL_INDENT, issue.reason);
    }
    if !issue.message.is_empty() {
        let _ = writeln!(out, "{}Message: {}", DETAIL_INDENT, issue.message);
    }
}

fn write_collection_errors(out: &mut String, report: &DiagnosticReport) {
    let errors: Vec<_> = report.collection_errors().collect();
    if errors.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}", "Could not collect:".red().bold());
    for error in errors {
        let _ = writeln!(out, "{} {}", "✗".red(), error);
    }
}

/// Prefix every line of a multi-line text with `prefix`
pub(crate) fn reflow(text: &str, prefix: &str) -> String {
    text.trim_end()
        .lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn color_status(status: &str) -> String {
    match status {
        "Failed" => status.red().to_string(),
        _ => status.yellow().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::fixtures;
    use crate::report::{ReportSection, Scope};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_reflow_indents_every_line() {
        assert_eq!(
            reflow("first\nsecond\n", TEXT_INDENT),
            "        first\n        second"
        );
    }

    #[test]
    fn test_console_lists_all_issues_without_cap() {
        plain();
        let report = fixtures::report(
            Scope::Namespace("shop".to_string()),
            vec![fixtures::namespace("shop", 8)],
        );
        let out = render_console(&report, RenderOptions::default());

        assert!(out.contains("Diagnostic Results for Namespace: shop"));
        assert!(out.contains("Unhealthy Pods:"));
        assert!(out.contains("[8] Pod: web-7"));
        assert!(!out.contains("more"));
        assert!(out.contains("[1] Pod: web-0"));
        assert!(out.contains("- app: Waiting (Restarts: 3)"));
        assert!(out.contains("Pods: 9 total (1 healthy, 8 unhealthy)"));
    }

    #[test]
    fn test_console_reflows_explanation() {
        plain();
        let mut ns = fixtures::namespace("shop", 0);
        let mut issue = fixtures::deployment_issue("api", "shop");
        issue.explanation = Some("Replicas are crashing.\nCheck the image tag.".to_string());
        issue.suggested_fix = Some("kubectl rollout undo deployment/api".to_string());
        ns.deployments.checked = 1;
        ns.deployments.issues.push(issue);
        let report = fixtures::report(Scope::Namespace("shop".to_string()), vec![ns]);

        let out = render_console(&report, RenderOptions::default());
        assert!(out.contains("Misconfigured Deployments:"));
        assert!(out.contains("        Replicas are crashing.\n        Check the image tag."));
        assert!(out.contains("        kubectl rollout undo deployment/api"));
        assert!(out.contains("Reason: InsufficientReadyReplicas"));
    }

    #[test]
    fn test_console_no_issues_message() {
        plain();
        let report = fixtures::report(
            Scope::Namespace("shop".to_string()),
            vec![fixtures::namespace("shop", 0)],
        );
        let out = render_console(&report, RenderOptions::default());
        assert!(out.contains(NO_ISSUES_MESSAGE));
        assert!(!out.contains("Unhealthy Pods:"));
    }

    #[test]
    fn test_console_shows_events_without_issues() {
        plain();
        let shop = fixtures::with_events(fixtures::namespace("shop", 0), 2);
        let report = fixtures::report(Scope::Namespace("shop".to_string()), vec![shop.clone()]);

        let out = render_console(&report, RenderOptions::default());
        assert!(out.contains(NO_ISSUES_MESSAGE));
        assert!(out.contains("Warning Events:"));
        assert!(out.contains("- Pod/job-1 FailedMount (x2)"));

        let report = fixtures::report(Scope::AllNamespaces, vec![shop]);
        let out = render_console(&report, RenderOptions::default());
        assert!(out.contains("Namespace: shop"));
        assert!(out.contains("- Pod/job-0 FailedMount (x2)"));
    }

    #[test]
    fn test_console_cluster_skips_healthy_namespaces() {
        plain();
        let mut healthy = fixtures::namespace("quiet", 0);
        healthy.record_error(ReportSection::Services, "forbidden");
        let report = fixtures::report(
            Scope::AllNamespaces,
            vec![fixtures::namespace("shop", 1), healthy],
        );

        let out = render_console(&report, RenderOptions::default());
        assert!(out.contains("Namespace: shop"));
        assert!(!out.contains("Namespace: quiet"));
        assert!(out.contains("Cluster Health: Unhealthy"));
        assert!(out.contains("quiet/services: forbidden"));

        let out = render_console(
            &report,
            RenderOptions {
                include_healthy: true,
            },
        );
        assert!(out.contains("Namespace: quiet"));
    }
}
