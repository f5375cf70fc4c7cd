//! Prompt construction for the explanation service

use crate::issue::{Issue, IssueDetails};
use std::fmt::Write;

const ANALYSIS_REQUEST: &str = "Please provide:
1. A diagnosis of the issue
2. Likely root causes
3. Recommended solutions
4. Specific kubectl commands to help diagnose or fix the issue
";

/// Prompt asking for an analysis of an issue
pub fn issue_prompt(issue: &Issue) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "As a Kubernetes expert, please analyze this {} issue:\n",
        issue.kind.as_str().to_lowercase()
    );

    match &issue.details {
        IssueDetails::Pod { node, containers } => {
            let _ = writeln!(out, "Pod: {}", issue.name);
            let _ = writeln!(out, "Namespace: {}", issue.namespace);
            let _ = writeln!(out, "Status: {}", issue.status);
            let _ = writeln!(out, "Node: {}", node.as_deref().unwrap_or("unassigned"));
            write_reason(&mut out, issue);

            out.push_str("\nContainer issues:\n");
            if containers.is_empty() {
                out.push_str("None\n");
            }
            for c in containers {
                let _ = write!(
                    out,
                    "- {}: {} (ready: {}, restarts: {})",
                    c.name, c.status, c.ready, c.restarts
                );
                if !c.reason.is_empty() {
                    let _ = write!(out, ", reason: {}", c.reason);
                }
                if let Some(code) = c.exit_code {
                    let _ = write!(out, ", exit code: {}", code);
                }
                if !c.message.is_empty() {
                    let _ = write!(out, ", message: {}", c.message);
                }
                out.push('\n');
            }
        }
        IssueDetails::Deployment {
            desired,
            ready,
            updated,
            available,
            strategy,
            conditions,
        } => {
            let _ = writeln!(out, "Deployment: {}", issue.name);
            let _ = writeln!(out, "Namespace: {}", issue.namespace);
            let _ = writeln!(out, "Replicas: {}/{} ready", ready, desired);
            let _ = writeln!(out, "Updated replicas: {}/{}", updated, desired);
            let _ = writeln!(out, "Available replicas: {}/{}", available, desired);
            let _ = writeln!(out, "Strategy: {}", strategy.as_deref().unwrap_or("unknown"));
            write_reason(&mut out, issue);

            out.push_str("\nConditions:\n");
            if conditions.is_empty() {
                out.push_str("None\n");
            }
            for c in conditions {
                let _ = writeln!(
                    out,
                    "- {}={}: {} {}",
                    c.condition_type, c.status, c.reason, c.message
                );
            }
        }
        IssueDetails::Service {
            service_type,
            endpoint_count,
            selector,
        } => {
            let _ = writeln!(out, "Service: {}", issue.name);
            let _ = writeln!(out, "Namespace: {}", issue.namespace);
            let _ = writeln!(out, "Type: {}", service_type);
            let selector = selector
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(",");
            let _ = writeln!(out, "Selector: {}", selector);
            let _ = writeln!(out, "Endpoints: {}", endpoint_count);
            write_reason(&mut out, issue);
        }
    }

    out.push_str("\nEvents:\n");
    if issue.events.is_empty() {
        out.push_str("None\n");
    }
    for e in &issue.events {
        let _ = writeln!(out, "- {} {} (x{}): {}", e.event_type, e.reason, e.count, e.message);
    }

    if !issue.logs.is_empty() {
        out.push_str("\nContainer logs (most recent):\n");
        for (container, logs) in &issue.logs {
            let _ = writeln!(out, "--- {} ---\n{}", container, logs);
        }
    }

    out.push('\n');
    out.push_str(ANALYSIS_REQUEST);
    out
}

/// Prompt asking for a concrete fix for an issue
pub fn fix_prompt(issue: &Issue) -> String {
    let mut description = format!(
        "{} {} in namespace {}: {}",
        issue.kind, issue.name, issue.namespace, issue.status
    );
    if !issue.reason.is_empty() {
        let _ = write!(description, "\nReason: {}", issue.reason);
    }
    if !issue.message.is_empty() {
        let _ = write!(description, "\nMessage: {}", issue.message);
    }
    for c in issue.containers() {
        let _ = write!(description, "\nContainer {}: {} {}", c.name, c.status, c.reason);
    }

    format!(
        "As a Kubernetes expert, please generate a fix for this issue:\n\n{}\n\n\
         Please provide:\n\
         1. A brief explanation of the fix\n\
         2. YAML patch or kubectl commands to apply the fix\n\
         3. Any additional steps needed\n",
        description
    )
}

/// Prompt asking for an explanation of a free-text error or manifest
pub fn error_prompt(text: &str) -> String {
    format!(
        "As a Kubernetes expert, please analyze this error message and explain:\n\
         1. What the error means\n\
         2. Likely causes\n\
         3. How to fix it\n\
         4. Specific kubectl commands that might help diagnose or fix the issue\n\n\
         Error message:\n{}\n",
        text.trim()
    )
}

fn write_reason(out: &mut String, issue: &Issue) {
    if !issue.reason.is_empty() {
        let _ = writeln!(out, "Reason: {}", issue.reason);
    }
    if !issue.message.is_empty() {
        let _ = writeln!(out, "Message: {}", issue.message);
    }
}
