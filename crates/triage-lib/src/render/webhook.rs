//! Chat webhook payloads

use super::{capped, more_line, RenderOptions, NESTED_ITEM_CAP, NO_ISSUES_MESSAGE, TOP_LEVEL_ITEM_CAP};
use crate::issue::{Issue, IssueDetails, ResourceKind};
use crate::report::{DiagnosticReport, NamespaceReport};
use serde::{Deserialize, Serialize};

/// Message body posted to an incoming webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Plain fallback shown in notifications
    pub text: String,
    pub blocks: Vec<Block>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Section { text: TextObject },
    Divider,
}

impl Block {
    pub fn section(text: impl Into<String>) -> Self {
        Block::Section {
            text: TextObject::mrkdwn(text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub text_type: String,
    pub text: String,
}

impl TextObject {
    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            text_type: "mrkdwn".to_string(),
            text: text.into(),
        }
    }
}

/// Colored side-bar group of blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub color: String,
    pub blocks: Vec<Block>,
}

fn kind_color(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Pod => "danger",
        ResourceKind::Deployment | ResourceKind::Service => "warning",
    }
}

/// Build the webhook message for a report
pub fn render_webhook(report: &DiagnosticReport, options: RenderOptions) -> WebhookPayload {
    let stats = report.stats();

    let title = if report.scope.is_cluster() {
        "*Kubernetes Cluster Health Report*".to_string()
    } else {
        format!(
            "*Kubernetes Diagnostic Results for Namespace: {}*",
            report.scope_label()
        )
    };

    let text = format!(
        "Kubernetes diagnostics for {}: {} issues ({} unhealthy pods, {} deployments, {} services)",
        report.scope_label(),
        stats.total_issues(),
        stats.pods.unhealthy,
        stats.deployments.unhealthy,
        stats.services.unhealthy
    );

    let mut blocks = vec![
        Block::section(title),
        Block::section(format!("*Time:* {}", report.generated_at.to_rfc2822())),
    ];
    if report.partial {
        blocks.push(Block::section(
            ":warning: Deadline reached; showing partial results",
        ));
    }
    blocks.push(Block::Divider);

    let mut summary = String::from("*Summary:*");
    if report.scope.is_cluster() {
        summary.push_str(&format!(
            "\n• Namespaces: {} ({} with issues)",
            stats.namespaces, stats.namespaces_with_issues
        ));
    }
    for kind in ResourceKind::ALL {
        let k = stats.kind(kind);
        summary.push_str(&format!(
            "\n• {}: {} ({} total)",
            kind.section_title(),
            k.unhealthy,
            k.total
        ));
    }
    summary.push_str(&format!("\n• Warning Events: {}", stats.warning_events));
    if report.scope.is_cluster() {
        summary.push_str(&format!("\n• Cluster Health: {}", stats.verdict()));
    }
    blocks.push(Block::section(summary));

    let mut attachments = Vec::new();

    if !report.has_issues() {
        blocks.push(Block::section(format!(":white_check_mark: {}", NO_ISSUES_MESSAGE)));
    }
    if let Some(ns) = report.primary_namespace() {
        attachments.extend(namespace_attachments(ns));
    } else {
        for ns in &report.namespaces {
            if ns.has_findings() {
                attachments.push(cluster_namespace_attachment(ns));
            } else if options.include_healthy {
                attachments.push(Attachment {
                    color: "good".to_string(),
                    blocks: vec![Block::section(format!("*Namespace: {}*\nNo issues", ns.namespace))],
                });
            }
        }
    }

    let errors: Vec<_> = report.collection_errors().collect();
    if !errors.is_empty() {
        let (shown, remaining) = capped(&errors, TOP_LEVEL_ITEM_CAP);
        let mut lines = String::from("*Could not collect:*");
        for error in shown {
            lines.push_str(&format!("\n• {}", error));
        }
        if remaining > 0 {
            lines.push_str(&format!("\n{}", more_line(remaining)));
        }
        attachments.push(Attachment {
            color: "#999999".to_string(),
            blocks: vec![Block::section(lines)],
        });
    }

    WebhookPayload {
        text,
        blocks,
        attachments,
    }
}

fn namespace_attachments(ns: &NamespaceReport) -> Vec<Attachment> {
    let mut attachments = Vec::new();

    for kind in ResourceKind::ALL {
        let issues = ns.issues(kind);
        if issues.is_empty() {
            continue;
        }
        let mut blocks = vec![Block::section(format!("*{}*", kind.section_title()))];
        let (shown, remaining) = capped(issues, TOP_LEVEL_ITEM_CAP);
        blocks.extend(shown.iter().map(|issue| Block::section(issue_text(issue))));
        if remaining > 0 {
            blocks.push(Block::section(more_line(remaining)));
        }
        attachments.push(Attachment {
            color: kind_color(kind).to_string(),
            blocks,
        });
    }

    if !ns.warning_events.is_empty() {
        let mut blocks = vec![Block::section("*Warning Events*")];
        let (shown, remaining) = capped(&ns.warning_events, TOP_LEVEL_ITEM_CAP);
        blocks.extend(shown.iter().map(|e| {
            Block::section(format!(
                "*{}*: {} (x{})\n{}",
                e.object, e.reason, e.count, e.message
            ))
        }));
        if remaining > 0 {
            blocks.push(Block::section(more_line(remaining)));
        }
        attachments.push(Attachment {
            color: "warning".to_string(),
            blocks,
        });
    }

    attachments
}

fn issue_text(issue: &Issue) -> String {
    let mut text = format!("*{}*: {}", issue.name, issue.status_summary());

    if let IssueDetails::Pod { containers, .. } = &issue.details {
        if !containers.is_empty() {
            text.push_str("\n*Container Issues:*");
            for c in containers {
                text.push_str(&format!("\n• {}: {}", c.name, c.status));
                if c.restarts > 0 {
                    text.push_str(&format!(" (Restarts: {})", c.restarts));
                }
                if !c.reason.is_empty() {
                    text.push_str(&format!(" - {}", c.reason));
                }
            }
        }
    } else if !issue.message.is_empty() {
        text.push_str(&format!("\n{}", issue.message));
    }

    if let Some(explanation) = &issue.explanation {
        text.push_str(&format!("\n*Analysis:* {}", explanation.trim()));
    }
    text
}

fn cluster_namespace_attachment(ns: &NamespaceReport) -> Attachment {
    let mut lines = format!("*Namespace: {}*", ns.namespace);
    let mut color = "warning";

    for kind in ResourceKind::ALL {
        let issues = ns.issues(kind);
        if issues.is_empty() {
            continue;
        }
        if kind == ResourceKind::Pod {
            color = "danger";
        }
        lines.push_str(&format!("\n*{}:* {}", kind.section_title(), issues.len()));
        let (shown, remaining) = capped(issues, NESTED_ITEM_CAP);
        for issue in shown {
            lines.push_str(&format!("\n• {}", issue.headline()));
        }
        if remaining > 0 {
            lines.push_str(&format!("\n• {}", more_line(remaining)));
        }
    }

    if !ns.warning_events.is_empty() {
        lines.push_str(&format!("\n*Warning Events:* {}", ns.warning_events.len()));
        let (shown, remaining) = capped(&ns.warning_events, NESTED_ITEM_CAP);
        for e in shown {
            lines.push_str(&format!("\n• {}: {} (x{})", e.object, e.reason, e.count));
        }
        if remaining > 0 {
            lines.push_str(&format!("\n• {}", more_line(remaining)));
        }
    }

    Attachment {
        color: color.to_string(),
        blocks: vec![Block::section(lines)],
    }
}
