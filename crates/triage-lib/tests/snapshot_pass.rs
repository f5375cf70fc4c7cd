//! End-to-end passes over JSON snapshots through the public API

use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use triage_lib::fetch::async_trait;
use triage_lib::render::{self, RenderOptions, NO_ISSUES_MESSAGE};
use triage_lib::{
    ContainerCondition, DeploymentRecord, Diagnostician, EndpointsRecord, EventQuery, EventRecord,
    FetchError, FetchResult, LogRequest, PodRecord, ResourceFetcher, ResourceKind, Scope, Selector,
    ServiceRecord, TriageConfig,
};

/// One namespace worth of fetched objects
#[derive(Debug, Default, Deserialize)]
struct Snapshot {
    #[serde(default)]
    pods: Vec<PodRecord>,
    #[serde(default)]
    deployments: Vec<DeploymentRecord>,
    #[serde(default)]
    services: Vec<ServiceRecord>,
    #[serde(default)]
    endpoints: Vec<EndpointsRecord>,
    #[serde(default)]
    events: Vec<EventRecord>,
}

struct SnapshotFetcher(Snapshot);

#[async_trait]
impl ResourceFetcher for SnapshotFetcher {
    async fn list_pods(&self, _namespace: &str) -> FetchResult<Vec<PodRecord>> {
        Ok(self.0.pods.clone())
    }

    async fn list_pods_matching(
        &self,
        _namespace: &str,
        _selector: &Selector,
    ) -> FetchResult<Vec<PodRecord>> {
        Ok(Vec::new())
    }

    async fn list_deployments(&self, _namespace: &str) -> FetchResult<Vec<DeploymentRecord>> {
        Ok(self.0.deployments.clone())
    }

    async fn list_services(&self, _namespace: &str) -> FetchResult<Vec<ServiceRecord>> {
        Ok(self.0.services.clone())
    }

    async fn get_endpoints(&self, _namespace: &str, name: &str) -> FetchResult<EndpointsRecord> {
        self.0
            .endpoints
            .iter()
            .find(|e| e.name == name)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                kind: "Endpoints".to_string(),
                name: name.to_string(),
            })
    }

    async fn list_events(
        &self,
        _namespace: &str,
        _query: EventQuery,
    ) -> FetchResult<Vec<EventRecord>> {
        Ok(self.0.events.clone())
    }

    async fn fetch_logs(&self, request: &LogRequest) -> FetchResult<String> {
        Err(FetchError::Transport(format!(
            "logs for {} unavailable",
            request.pod
        )))
    }

    async fn list_namespaces(&self) -> FetchResult<Vec<String>> {
        Ok(vec!["shop".to_string()])
    }

    fn default_namespace(&self) -> String {
        "shop".to_string()
    }
}

const UNHEALTHY_SNAPSHOT: &str = r#"{
    "pods": [{
        "name": "web-1",
        "namespace": "shop",
        "phase": "Running",
        "containerStatuses": [{
            "name": "app",
            "ready": false,
            "restartCount": 2,
            "state": {"state": "waiting", "reason": "CrashLoopBackOff", "message": "back-off 40s"}
        }]
    }],
    "deployments": [{
        "name": "api",
        "namespace": "shop",
        "desiredReplicas": 5,
        "readyReplicas": 2,
        "updatedReplicas": 5,
        "availableReplicas": 2,
        "conditions": [
            {"type": "Available", "status": "True"},
            {"type": "Progressing", "status": "True"}
        ]
    }],
    "services": [{
        "name": "x",
        "namespace": "shop",
        "serviceType": "ClusterIP",
        "selector": {"app": "x"}
    }],
    "endpoints": [{"name": "x", "namespace": "shop", "subsets": [{"addresses": []}]}],
    "events": [{
        "name": "web-1.1",
        "namespace": "shop",
        "type": "Warning",
        "reason": "BackOff",
        "message": "Back-off restarting failed container",
        "count": 4,
        "lastTimestamp": "2024-05-01T11:50:00Z",
        "involvedObject": {"kind": "Pod", "name": "web-1", "namespace": "shop"}
    }]
}"#;

async fn run_snapshot(json: &str) -> triage_lib::DiagnosticReport {
    let snapshot: Snapshot = serde_json::from_str(json).unwrap();
    Diagnostician::new(Arc::new(SnapshotFetcher(snapshot)), TriageConfig::default())
        .with_evaluation_time(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        .run(Scope::Namespace("shop".to_string()))
        .await
}

#[tokio::test]
async fn test_crash_looping_pod_is_reported() {
    let report = run_snapshot(UNHEALTHY_SNAPSHOT).await;
    let pods: Vec<_> = report.issues(ResourceKind::Pod).collect();

    assert_eq!(pods.len(), 1);
    assert_eq!(pods[0].status, "Running");
    let container = &pods[0].containers()[0];
    assert_eq!(container.status, ContainerCondition::Waiting);
    assert_eq!(container.reason, "CrashLoopBackOff");
    assert_eq!(pods[0].events.len(), 1);
    assert_eq!(pods[0].events[0].reason, "BackOff");
}

#[tokio::test]
async fn test_short_deployment_is_reported() {
    let report = run_snapshot(UNHEALTHY_SNAPSHOT).await;
    let deployments: Vec<_> = report.issues(ResourceKind::Deployment).collect();

    assert_eq!(deployments.len(), 1);
    assert_eq!(deployments[0].reason, "InsufficientReadyReplicas");
    assert!(deployments[0].message.contains("2/5"));
}

#[tokio::test]
async fn test_service_without_endpoints_is_reported() {
    let report = run_snapshot(UNHEALTHY_SNAPSHOT).await;
    let services: Vec<_> = report.issues(ResourceKind::Service).collect();

    assert_eq!(services.len(), 1);
    assert_eq!(services[0].reason, "NoEndpointsAvailable");
    assert_eq!(services[0].status, "0 endpoints");
    assert!(services[0].message.contains("app=x"));
}

#[tokio::test]
async fn test_unhealthy_report_renders_every_channel() {
    let report = run_snapshot(UNHEALTHY_SNAPSHOT).await;
    let options = RenderOptions::default();

    let document = render::render_document(&report, options);
    assert!(document.contains("## Unhealthy Pods"));
    assert!(document.contains("## Misconfigured Deployments"));
    assert!(document.contains("## Service Issues"));
    assert!(!document.contains(NO_ISSUES_MESSAGE));

    let payload = render::render_webhook(&report, options);
    // three categories plus warning events
    assert_eq!(payload.attachments.len(), 4);

    let json: serde_json::Value =
        serde_json::from_str(&render::render_json(&report).unwrap()).unwrap();
    assert_eq!(json["stats"]["deployments"]["unhealthy"], 1);
}

#[tokio::test]
async fn test_healthy_namespace_renders_no_issues_message() {
    let report = run_snapshot("{}").await;
    let options = RenderOptions::default();

    assert!(!report.has_issues());
    for rendered in [
        render::render_console(&report, options),
        render::render_document(&report, options),
    ] {
        assert!(rendered.contains(NO_ISSUES_MESSAGE));
        assert!(!rendered.contains("Unhealthy Pods:"));
        assert!(!rendered.contains("## Unhealthy Pods"));
    }

    let payload = render::render_webhook(&report, options);
    assert!(payload.attachments.is_empty());
}
