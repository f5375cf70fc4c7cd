//! Deployment health classification

use crate::issue::{Issue, IssueDetails, ResourceKind};
use crate::records::DeploymentRecord;

pub const INSUFFICIENT_READY_REPLICAS: &str = "InsufficientReadyReplicas";
pub const STALLED_ROLLOUT: &str = "StalledRollout";
const UNAVAILABLE_REPLICAS: &str = "UnavailableReplicas";

/// Classify a deployment, returning an issue if it fails any health predicate
pub fn classify_deployment(deployment: &DeploymentRecord) -> Option<Issue> {
    let desired = deployment.desired_replicas;

    // Scaled to zero on purpose
    if desired == 0 {
        return None;
    }

    let replicas_match = deployment.ready_replicas == desired
        && deployment.updated_replicas == desired
        && deployment.available_replicas == desired;
    let failing: Vec<_> = deployment
        .conditions
        .iter()
        .filter(|c| !c.is_true())
        .cloned()
        .collect();

    if replicas_match && failing.is_empty() {
        return None;
    }

    let (reason, message) = if deployment.ready_replicas < desired {
        (
            INSUFFICIENT_READY_REPLICAS.to_string(),
            format!(
                "Only {}/{} replicas are ready",
                deployment.ready_replicas, desired
            ),
        )
    } else if deployment.updated_replicas < desired {
        (
            STALLED_ROLLOUT.to_string(),
            format!(
                "Rollout is stalled with {}/{} replicas updated",
                deployment.updated_replicas, desired
            ),
        )
    } else if let Some(condition) = failing.first() {
        (condition.reason.clone(), condition.message.clone())
    } else {
        // Ready and updated are satisfied, so availability or a surplus is off
        (
            UNAVAILABLE_REPLICAS.to_string(),
            format!(
                "{}/{} replicas are available ({} ready, {} updated)",
                deployment.available_replicas,
                desired,
                deployment.ready_replicas,
                deployment.updated_replicas
            ),
        )
    };

    let mut issue = Issue::new(
        ResourceKind::Deployment,
        &deployment.name,
        &deployment.namespace,
        format!("{}/{}", deployment.ready_replicas, desired),
        IssueDetails::Deployment {
            desired,
            ready: deployment.ready_replicas,
            updated: deployment.updated_replicas,
            available: deployment.available_replicas,
            strategy: deployment.strategy.clone(),
            conditions: failing,
        },
    );
    issue.reason = reason;
    issue.message = message;

    Some(issue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Condition;

    fn deployment(desired: i32, ready: i32, updated: i32, available: i32) -> DeploymentRecord {
        DeploymentRecord {
            name: "api".to_string(),
            namespace: "default".to_string(),
            desired_replicas: desired,
            ready_replicas: ready,
            updated_replicas: updated,
            available_replicas: available,
            strategy: Some("RollingUpdate".to_string()),
            conditions: vec![
                condition("Available", "True", "MinimumReplicasAvailable"),
                condition("Progressing", "True", "NewReplicaSetAvailable"),
            ],
        }
    }

    fn condition(kind: &str, status: &str, reason: &str) -> Condition {
        Condition {
            condition_type: kind.to_string(),
            status: status.to_string(),
            reason: reason.to_string(),
            message: format!("{} detail", reason),
        }
    }

    #[test]
    fn test_matching_replicas_are_healthy() {
        assert!(classify_deployment(&deployment(3, 3, 3, 3)).is_none());
    }

    #[test]
    fn test_scaled_to_zero_is_always_healthy() {
        let mut d = deployment(0, 2, 0, 1);
        d.conditions = vec![condition("Available", "False", "MinimumReplicasUnavailable")];
        assert!(classify_deployment(&d).is_none());
    }

    #[test]
    fn test_insufficient_ready_replicas() {
        let issue = classify_deployment(&deployment(5, 2, 5, 2)).unwrap();
        assert_eq!(issue.kind, ResourceKind::Deployment);
        assert_eq!(issue.status, "2/5");
        assert_eq!(issue.reason, INSUFFICIENT_READY_REPLICAS);
        assert!(issue.message.contains("2/5"));
    }

    #[test]
    fn test_ready_shortfall_beats_stalled_rollout_and_conditions() {
        let mut d = deployment(4, 1, 2, 1);
        d.conditions = vec![condition("Progressing", "False", "ProgressDeadlineExceeded")];
        let issue = classify_deployment(&d).unwrap();
        assert_eq!(issue.reason, INSUFFICIENT_READY_REPLICAS);
    }

    #[test]
    fn test_stalled_rollout() {
        let mut d = deployment(3, 3, 1, 3);
        d.conditions = vec![condition("Progressing", "False", "ProgressDeadlineExceeded")];
        let issue = classify_deployment(&d).unwrap();
        assert_eq!(issue.reason, STALLED_ROLLOUT);
        assert!(issue.message.contains("1/3"));
    }

    #[test]
    fn test_failing_condition_when_counts_match() {
        let mut d = deployment(2, 2, 2, 2);
        d.conditions = vec![
            condition("Available", "True", "MinimumReplicasAvailable"),
            condition("ReplicaFailure", "False", "FailedCreate"),
            condition("Progressing", "Unknown", "Stuck"),
        ];

        let issue = classify_deployment(&d).unwrap();
        assert_eq!(issue.reason, "FailedCreate");
        assert_eq!(issue.message, "FailedCreate detail");
        match &issue.details {
            IssueDetails::Deployment { conditions, .. } => {
                let types: Vec<_> = conditions.iter().map(|c| c.condition_type.as_str()).collect();
                assert_eq!(types, vec!["ReplicaFailure", "Progressing"]);
            }
            other => panic!("unexpected details: {:?}", other),
        }
    }

    #[test]
    fn test_unavailable_replicas_fallback() {
        let issue = classify_deployment(&deployment(3, 3, 3, 1)).unwrap();
        assert_eq!(issue.reason, UNAVAILABLE_REPLICAS);
        assert!(issue.message.contains("1/3"));
    }

    #[test]
    fn test_classification_is_idempotent() {
        let d = deployment(5, 2, 5, 2);
        assert_eq!(classify_deployment(&d), classify_deployment(&d));
    }
}
