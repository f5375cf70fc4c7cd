//! Service health classification

use crate::issue::{Issue, IssueDetails, ResourceKind};
use crate::records::{PodRecord, ServiceRecord};

pub const NO_ENDPOINTS_REASON: &str = "NoEndpointsAvailable";
pub const NO_ENDPOINTS_MESSAGE: &str = "Service has no endpoint pods";
pub const ENDPOINTS_UNAVAILABLE: &str = "EndpointsUnavailable";

/// Services without a selector have no meaningful endpoint health
pub fn is_skipped(service: &ServiceRecord) -> bool {
    service.selector.is_empty()
}

/// Classify a service given its ready endpoint count.
///
/// `matching_pods` is the result of the secondary selector lookup; `None`
/// means the lookup failed and the generic message is used instead.
pub fn classify_service(
    service: &ServiceRecord,
    endpoint_count: usize,
    matching_pods: Option<&[PodRecord]>,
) -> Option<Issue> {
    if is_skipped(service) || endpoint_count > 0 {
        return None;
    }

    let mut issue = Issue::new(
        ResourceKind::Service,
        &service.name,
        &service.namespace,
        format!("{} endpoints", endpoint_count),
        IssueDetails::Service {
            service_type: service.service_type.clone(),
            endpoint_count,
            selector: service.selector.clone(),
        },
    );
    issue.reason = NO_ENDPOINTS_REASON.to_string();
    issue.message = match matching_pods {
        Some(pods) => format!(
            "{}. Matching pods status: {}",
            NO_ENDPOINTS_MESSAGE,
            matching_pods_status(service, pods)
        ),
        None => NO_ENDPOINTS_MESSAGE.to_string(),
    };

    Some(issue)
}

/// Issue for a service whose endpoints object could not be retrieved
pub fn endpoints_unavailable(service: &ServiceRecord, error: &str) -> Issue {
    let mut issue = Issue::new(
        ResourceKind::Service,
        &service.name,
        &service.namespace,
        "unknown endpoints",
        IssueDetails::Service {
            service_type: service.service_type.clone(),
            endpoint_count: 0,
            selector: service.selector.clone(),
        },
    );
    issue.reason = ENDPOINTS_UNAVAILABLE.to_string();
    issue.message = format!("Cannot retrieve endpoints: {}", error);
    issue
}

/// Render a selector as `k=v,k2=v2`
pub fn selector_string(service: &ServiceRecord) -> String {
    service
        .selector
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

fn matching_pods_status(service: &ServiceRecord, pods: &[PodRecord]) -> String {
    if pods.is_empty() {
        return format!("no pods match selector {}", selector_string(service));
    }

    pods.iter()
        .map(|pod| {
            let ready = pod.container_statuses.iter().filter(|c| c.ready).count();
            format!(
                "{} ({}, {}/{} ready)",
                pod.name,
                pod.phase,
                ready,
                pod.container_statuses.len()
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
