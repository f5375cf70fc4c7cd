//! Resource fetcher contract
//!
//! The diagnostic pass never talks to a cluster directly. Everything it reads
//! comes through a [`ResourceFetcher`], which the binary backs with an API
//! client and tests back with in-memory snapshots.

use crate::error::FetchError;
use crate::records::{
    DeploymentRecord, EndpointsRecord, EventRecord, PodRecord, Selector, ServiceRecord,
};

pub use async_trait::async_trait;

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Which events to request for a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventQuery {
    /// Only `type == Warning`, filtered upstream
    WarningsOnly,
    /// Every event; relevance is decided by the correlator
    All,
}

/// Parameters for a container log request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRequest {
    pub pod: String,
    pub namespace: String,
    pub container: String,
    pub tail_lines: i64,
    /// Read the logs of the previous container instance
    pub previous: bool,
}

/// Trait for cluster read access
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn list_pods(&self, namespace: &str) -> FetchResult<Vec<PodRecord>>;

    /// List pods matching a label selector
    async fn list_pods_matching(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> FetchResult<Vec<PodRecord>>;

    async fn list_deployments(&self, namespace: &str) -> FetchResult<Vec<DeploymentRecord>>;

    async fn list_services(&self, namespace: &str) -> FetchResult<Vec<ServiceRecord>>;

    /// Fetch the endpoints object backing a service
    async fn get_endpoints(&self, namespace: &str, name: &str) -> FetchResult<EndpointsRecord>;

    async fn list_events(
        &self,
        namespace: &str,
        query: EventQuery,
    ) -> FetchResult<Vec<EventRecord>>;

    /// Fetch the tail of a container's log
    async fn fetch_logs(&self, request: &LogRequest) -> FetchResult<String>;

    async fn list_namespaces(&self) -> FetchResult<Vec<String>>;

    /// Namespace used when none is given explicitly
    fn default_namespace(&self) -> String;
}
