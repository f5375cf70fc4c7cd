//! Pod health classification

use crate::issue::{ContainerCondition, ContainerIssue, Issue, IssueDetails, ResourceKind};
use crate::records::{ContainerState, ContainerStatusRecord, PodPhase, PodRecord};

/// Restart count above which a running container is still considered unhealthy
pub const MAX_HEALTHY_RESTARTS: i32 = 5;

/// Reason attached to ready containers that keep restarting
pub const HIGH_RESTART_COUNT: &str = "HighRestartCount";

/// Classify a pod, returning an issue if it fails any health predicate
pub fn classify_pod(pod: &PodRecord) -> Option<Issue> {
    if is_healthy(pod) {
        return None;
    }

    let containers = pod
        .container_statuses
        .iter()
        .filter_map(container_issue)
        .collect();

    let mut issue = Issue::new(
        ResourceKind::Pod,
        &pod.name,
        &pod.namespace,
        pod.phase.as_str(),
        IssueDetails::Pod {
            node: pod.node_name.clone(),
            containers,
        },
    );

    // First non-true condition wins; an empty reason is a valid outcome
    if let Some(condition) = pod.conditions.iter().find(|c| !c.is_true()) {
        issue.reason = condition.reason.clone();
        issue.message = condition.message.clone();
    }

    Some(issue)
}

fn is_healthy(pod: &PodRecord) -> bool {
    match pod.phase {
        PodPhase::Succeeded => true,
        PodPhase::Running => pod
            .container_statuses
            .iter()
            .all(|c| c.ready && c.restart_count <= MAX_HEALTHY_RESTARTS),
        PodPhase::Pending | PodPhase::Failed | PodPhase::Unknown => false,
    }
}

fn container_issue(status: &ContainerStatusRecord) -> Option<ContainerIssue> {
    if !status.ready {
        let (condition, reason, message, exit_code) = match &status.state {
            ContainerState::Waiting { reason, message } => (
                ContainerCondition::Waiting,
                reason.clone(),
                message.clone(),
                None,
            ),
            ContainerState::Terminated(t) => (
                ContainerCondition::Terminated,
                t.reason.clone(),
                t.message.clone(),
                Some(t.exit_code),
            ),
            ContainerState::Running | ContainerState::Unknown => {
                (ContainerCondition::NotReady, String::new(), String::new(), None)
            }
        };

        return Some(ContainerIssue {
            name: status.name.clone(),
            ready: false,
            restarts: status.restart_count,
            status: condition,
            reason,
            message,
            exit_code,
        });
    }

    if status.restart_count > MAX_HEALTHY_RESTARTS {
        let mut message = format!("Container has restarted {} times", status.restart_count);
        if let Some(last) = &status.last_termination {
            if !last.reason.is_empty() {
                message.push_str(&format!("; last terminated with {}", last.reason));
            } else {
                message.push_str("; last terminated");
            }
            message.push_str(&format!(" (exit code {})", last.exit_code));
        }

        return Some(ContainerIssue {
            name: status.name.clone(),
            ready: true,
            restarts: status.restart_count,
            status: ContainerCondition::Running,
            reason: HIGH_RESTART_COUNT.to_string(),
            message,
            exit_code: status.last_termination.as_ref().map(|t| t.exit_code),
        });
    }

    None
}
