//! Cluster API backed resource fetcher

use anyhow::{Context, Result};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{
    ContainerState as ApiContainerState, ContainerStatus, Endpoints, Event, Namespace, Pod,
    Service,
};
use kube::api::{Api, ListParams, LogParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::Path;
use tracing::debug;
use triage_lib::fetch::{EventQuery, FetchResult, LogRequest, ResourceFetcher};
use triage_lib::{
    Condition, ContainerState, ContainerStatusRecord, DeploymentRecord, EndpointSubset,
    EndpointsRecord, EventRecord, FetchError, ObjectRef, PodPhase, PodRecord, Selector,
    ServiceRecord, Termination,
};

/// Reads workload state through the Kubernetes API
pub struct KubeFetcher {
    client: Client,
}

impl KubeFetcher {
    /// Connect using an explicit kubeconfig, or the inferred configuration
    /// (in-cluster service account, then `~/.kube/config`)
    pub async fn connect(kubeconfig: Option<&Path>) -> Result<Self> {
        let config = match kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
                Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .context("Invalid kubeconfig")?
            }
            None => Config::infer()
                .await
                .context("Failed to infer cluster configuration")?,
        };

        let client = Client::try_from(config).context("Failed to create Kubernetes client")?;
        Ok(Self { client })
    }

    fn api<K>(&self, namespace: &str) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn map_error(kind: &str, name: &str, err: kube::Error) -> FetchError {
    match err {
        kube::Error::Api(response) if response.code == 404 => FetchError::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
        },
        kube::Error::SerdeError(e) => FetchError::Decode(e.to_string()),
        other => FetchError::Transport(other.to_string()),
    }
}

fn selector_query(selector: &Selector) -> String {
    selector
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

#[async_trait]
impl ResourceFetcher for KubeFetcher {
    async fn list_pods(&self, namespace: &str) -> FetchResult<Vec<PodRecord>> {
        let pods = self
            .api::<Pod>(namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| map_error("pods in namespace", namespace, e))?;
        Ok(pods.items.into_iter().map(pod_record).collect())
    }

    async fn list_pods_matching(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> FetchResult<Vec<PodRecord>> {
        let params = ListParams::default().labels(&selector_query(selector));
        let pods = self
            .api::<Pod>(namespace)
            .list(&params)
            .await
            .map_err(|e| map_error("pods in namespace", namespace, e))?;
        Ok(pods.items.into_iter().map(pod_record).collect())
    }

    async fn list_deployments(&self, namespace: &str) -> FetchResult<Vec<DeploymentRecord>> {
        let deployments = self
            .api::<Deployment>(namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| map_error("deployments in namespace", namespace, e))?;
        Ok(deployments.items.into_iter().map(deployment_record).collect())
    }

    async fn list_services(&self, namespace: &str) -> FetchResult<Vec<ServiceRecord>> {
        let services = self
            .api::<Service>(namespace)
            .list(&ListParams::default())
            .await
            .map_err(|e| map_error("services in namespace", namespace, e))?;
        Ok(services.items.into_iter().map(service_record).collect())
    }

    async fn get_endpoints(&self, namespace: &str, name: &str) -> FetchResult<EndpointsRecord> {
        let endpoints = self
            .api::<Endpoints>(namespace)
            .get(name)
            .await
            .map_err(|e| map_error("endpoints", name, e))?;
        Ok(endpoints_record(endpoints))
    }

    async fn list_events(
        &self,
        namespace: &str,
        query: EventQuery,
    ) -> FetchResult<Vec<EventRecord>> {
        let params = match query {
            EventQuery::WarningsOnly => ListParams::default().fields("type=Warning"),
            EventQuery::All => ListParams::default(),
        };
        let events = self
            .api::<Event>(namespace)
            .list(&params)
            .await
            .map_err(|e| map_error("events in namespace", namespace, e))?;
        Ok(events.items.into_iter().map(event_record).collect())
    }

    async fn fetch_logs(&self, request: &LogRequest) -> FetchResult<String> {
        debug!(
            pod = %request.pod,
            container = %request.container,
            previous = request.previous,
            "Fetching container logs"
        );
        let params = LogParams {
            container: Some(request.container.clone()),
            tail_lines: Some(request.tail_lines),
            previous: request.previous,
            ..Default::default()
        };
        self.api::<Pod>(&request.namespace)
            .logs(&request.pod, &params)
            .await
            .map_err(|e| map_error("pod", &request.pod, e))
    }

    async fn list_namespaces(&self) -> FetchResult<Vec<String>> {
        let namespaces = Api::<Namespace>::all(self.client.clone())
            .list(&ListParams::default())
            .await
            .map_err(|e| map_error("namespaces", "", e))?;
        Ok(namespaces
            .items
            .into_iter()
            .filter_map(|ns| ns.metadata.name)
            .collect())
    }

    fn default_namespace(&self) -> String {
        self.client.default_namespace().to_string()
    }
}

fn pod_record(pod: Pod) -> PodRecord {
    let status = pod.status.unwrap_or_default();
    PodRecord {
        name: pod.metadata.name.unwrap_or_default(),
        namespace: pod.metadata.namespace.unwrap_or_default(),
        phase: PodPhase::parse(status.phase.as_deref().unwrap_or("Unknown")),
        node_name: pod.spec.and_then(|spec| spec.node_name),
        conditions: status
            .conditions
            .unwrap_or_default()
            .into_iter()
            .map(|c| Condition {
                condition_type: c.type_,
                status: c.status,
                reason: c.reason.unwrap_or_default(),
                message: c.message.unwrap_or_default(),
            })
            .collect(),
        container_statuses: status
            .container_statuses
            .unwrap_or_default()
            .into_iter()
            .map(container_record)
            .collect(),
    }
}

fn container_record(status: ContainerStatus) -> ContainerStatusRecord {
    ContainerStatusRecord {
        name: status.name,
        image: status.image,
        ready: status.ready,
        restart_count: status.restart_count,
        state: status
            .state
            .map(container_state)
            .unwrap_or(ContainerState::Unknown),
        last_termination: status
            .last_state
            .and_then(|state| state.terminated)
            .map(|t| Termination {
                reason: t.reason.unwrap_or_default(),
                message: t.message.unwrap_or_default(),
                exit_code: t.exit_code,
            }),
    }
}

/// Waiting wins over terminated, which wins over running
fn container_state(state: ApiContainerState) -> ContainerState {
    if let Some(waiting) = state.waiting {
        ContainerState::Waiting {
            reason: waiting.reason.unwrap_or_default(),
            message: waiting.message.unwrap_or_default(),
        }
    } else if let Some(t) = state.terminated {
        ContainerState::Terminated(Termination {
            reason: t.reason.unwrap_or_default(),
            message: t.message.unwrap_or_default(),
            exit_code: t.exit_code,
        })
    } else if state.running.is_some() {
        ContainerState::Running
    } else {
        ContainerState::Unknown
    }
}

fn deployment_record(deployment: Deployment) -> DeploymentRecord {
    let spec = deployment.spec.unwrap_or_default();
    let status = deployment.status.unwrap_or_default();
    DeploymentRecord {
        name: deployment.metadata.name.unwrap_or_default(),
        namespace: deployment.metadata.namespace.unwrap_or_default(),
        desired_replicas: spec.replicas.unwrap_or(1),
        ready_replicas: status.ready_replicas.unwrap_or(0),
        updated_replicas: status.updated_replicas.unwrap_or(0),
        available_replicas: status.available_replicas.unwrap_or(0),
        strategy: spec.strategy.and_then(|s| s.type_),
        conditions: status
            .conditions
            .unwrap_or_default()
            .into_iter()
            .map(|c| Condition {
                condition_type: c.type_,
                status: c.status,
                reason: c.reason.unwrap_or_default(),
                message: c.message.unwrap_or_default(),
            })
            .collect(),
    }
}

fn service_record(service: Service) -> ServiceRecord {
    let spec = service.spec.unwrap_or_default();
    ServiceRecord {
        name: service.metadata.name.unwrap_or_default(),
        namespace: service.metadata.namespace.unwrap_or_default(),
        service_type: spec.type_.unwrap_or_else(|| "ClusterIP".to_string()),
        cluster_ip: spec.cluster_ip,
        selector: spec.selector.unwrap_or_default(),
    }
}

fn endpoints_record(endpoints: Endpoints) -> EndpointsRecord {
    EndpointsRecord {
        name: endpoints.metadata.name.unwrap_or_default(),
        namespace: endpoints.metadata.namespace.unwrap_or_default(),
        subsets: endpoints
            .subsets
            .unwrap_or_default()
            .into_iter()
            .map(|subset| EndpointSubset {
                addresses: subset
                    .addresses
                    .unwrap_or_default()
                    .into_iter()
                    .map(|a| a.ip)
                    .collect(),
                not_ready_addresses: subset
                    .not_ready_addresses
                    .unwrap_or_default()
                    .into_iter()
                    .map(|a| a.ip)
                    .collect(),
            })
            .collect(),
    }
}

fn event_record(event: Event) -> EventRecord {
    let involved = event.involved_object;
    EventRecord {
        name: event.metadata.name.unwrap_or_default(),
        namespace: event.metadata.namespace.unwrap_or_default(),
        event_type: event.type_.unwrap_or_default(),
        reason: event.reason.unwrap_or_default(),
        message: event.message.unwrap_or_default(),
        count: event.count.unwrap_or(1),
        last_timestamp: event
            .last_timestamp
            .map(|t| t.0.to_rfc3339())
            .or_else(|| event.event_time.map(|t| t.0.to_rfc3339())),
        involved_object: ObjectRef {
            kind: involved.kind.unwrap_or_default(),
            name: involved.name.unwrap_or_default(),
            namespace: involved.namespace.unwrap_or_default(),
        },
    }
}
