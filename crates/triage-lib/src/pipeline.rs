//! Diagnostic pass
//!
//! Walks the requested namespaces one at a time and, within each namespace,
//! one resource kind at a time: fetch, classify, enrich, optionally annotate,
//! then place the issue into the report. The whole pass runs under a single
//! deadline; when it expires the report assembled so far is returned and
//! marked partial.

use crate::classify::{self, classify_deployment, classify_pod, classify_service};
use crate::config::TriageConfig;
use crate::enrich;
use crate::error::FetchError;
use crate::events::EventCorrelator;
use crate::explain::Explainer;
use crate::fetch::{EventQuery, ResourceFetcher};
use crate::issue::{Issue, ResourceKind};
use crate::observability::{StructuredLogger, TriageMetrics};
use crate::prompt;
use crate::records::EventRecord;
use crate::report::{CollectionError, DiagnosticReport, NamespaceReport, ReportSection, Scope};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Which parts of a namespace to inspect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindSelection {
    pub pods: bool,
    pub deployments: bool,
    pub services: bool,
    /// Namespace-wide warning events section
    pub events: bool,
}

impl Default for KindSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl KindSelection {
    pub fn all() -> Self {
        Self {
            pods: true,
            deployments: true,
            services: true,
            events: true,
        }
    }

    pub fn includes(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Pod => self.pods,
            ResourceKind::Deployment => self.deployments,
            ResourceKind::Service => self.services,
        }
    }
}

/// Runs diagnostic passes against a fetcher
pub struct Diagnostician {
    fetcher: Arc<dyn ResourceFetcher>,
    explainer: Option<Arc<dyn Explainer>>,
    config: TriageConfig,
    kinds: KindSelection,
    evaluation_time: Option<DateTime<Utc>>,
    metrics: TriageMetrics,
}

impl Diagnostician {
    pub fn new(fetcher: Arc<dyn ResourceFetcher>, config: TriageConfig) -> Self {
        Self {
            fetcher,
            explainer: None,
            config,
            kinds: KindSelection::all(),
            evaluation_time: None,
            metrics: TriageMetrics::new(),
        }
    }

    pub fn with_explainer(mut self, explainer: Option<Arc<dyn Explainer>>) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn with_kinds(mut self, kinds: KindSelection) -> Self {
        self.kinds = kinds;
        self
    }

    /// Pin the clock used for the event recency filter
    pub fn with_evaluation_time(mut self, now: DateTime<Utc>) -> Self {
        self.evaluation_time = Some(now);
        self
    }

    /// Run one pass and return whatever could be collected
    pub async fn run(&self, scope: Scope) -> DiagnosticReport {
        let now = self.evaluation_time.unwrap_or_else(Utc::now);
        let logger = StructuredLogger::new(match &scope {
            Scope::Namespace(ns) => ns.as_str(),
            Scope::AllNamespaces => "cluster",
        });
        let mut report = DiagnosticReport::new(scope, now);
        let started = Instant::now();

        let finished = tokio::time::timeout(
            self.config.timeout(),
            self.collect(&mut report, now, &logger),
        )
        .await
        .is_ok();

        if !finished {
            report.partial = true;
        }

        let elapsed = started.elapsed().as_secs_f64();
        self.metrics.observe_pass_latency(elapsed);
        logger.log_completed(&report.stats(), report.partial, elapsed);

        report
    }

    async fn collect(&self, report: &mut DiagnosticReport, now: DateTime<Utc>, logger: &StructuredLogger) {
        let namespaces = match &report.scope {
            Scope::Namespace(ns) => vec![ns.clone()],
            Scope::AllNamespaces => match self.fetcher.list_namespaces().await {
                Ok(namespaces) => namespaces,
                Err(e) => {
                    let error = CollectionError {
                        namespace: String::new(),
                        section: ReportSection::Namespaces,
                        message: e.to_string(),
                    };
                    logger.log_collection_failed(&error);
                    self.metrics.inc_collection_failures(ReportSection::Namespaces.as_str());
                    report.errors.push(error);
                    return;
                }
            },
        };

        logger.log_started(namespaces.len(), self.config.timeout_secs);

        for namespace in namespaces {
            let idx = report.namespaces.len();
            report.namespaces.push(NamespaceReport::new(namespace));
            self.collect_namespace(&mut report.namespaces[idx], now, logger)
                .await;
        }
    }

    async fn collect_namespace(
        &self,
        ns: &mut NamespaceReport,
        now: DateTime<Utc>,
        logger: &StructuredLogger,
    ) {
        debug!(namespace = %ns.namespace, "Collecting namespace");

        let (events, query) = self.fetch_events(ns, logger).await;
        let correlator =
            EventCorrelator::new(now, query).with_max_age(self.config.event_max_age());

        if self.kinds.events {
            ns.warning_events =
                correlator.namespace_events(&events, self.config.max_namespace_events);
        }

        for kind in ResourceKind::ALL {
            if !self.kinds.includes(kind) {
                continue;
            }
            let result = match kind {
                ResourceKind::Pod => self.collect_pods(ns, &correlator, &events, logger).await,
                ResourceKind::Deployment => {
                    self.collect_deployments(ns, &correlator, &events, logger)
                        .await
                }
                ResourceKind::Service => {
                    self.collect_services(ns, &correlator, &events, logger)
                        .await
                }
            };

            if let Err(e) = result {
                self.record_failure(ns, kind.into(), &e, logger);
            }
        }
    }

    /// Warning events first; the unfiltered listing if that fails
    async fn fetch_events(
        &self,
        ns: &mut NamespaceReport,
        logger: &StructuredLogger,
    ) -> (Vec<EventRecord>, EventQuery) {
        match self
            .fetcher
            .list_events(&ns.namespace, EventQuery::WarningsOnly)
            .await
        {
            Ok(events) => return (events, EventQuery::WarningsOnly),
            Err(e) => {
                debug!(namespace = %ns.namespace, error = %e, "Warning event listing failed, falling back to all events");
            }
        }

        match self.fetcher.list_events(&ns.namespace, EventQuery::All).await {
            Ok(events) => (events, EventQuery::All),
            Err(e) => {
                self.record_failure(ns, ReportSection::Events, &e, logger);
                (Vec::new(), EventQuery::All)
            }
        }
    }

    async fn collect_pods(
        &self,
        ns: &mut NamespaceReport,
        correlator: &EventCorrelator,
        events: &[EventRecord],
        logger: &StructuredLogger,
    ) -> Result<(), FetchError> {
        let pods = self.fetcher.list_pods(&ns.namespace).await?;
        let mut explained = 0;

        for pod in &pods {
            if let Some(mut issue) = classify_pod(pod) {
                enrich::attach_events(&mut issue, correlator, events, self.config.max_events);
                let failures = enrich::attach_logs(
                    &mut issue,
                    self.fetcher.as_ref(),
                    self.config.log_tail_lines,
                )
                .await;
                if failures > 0 {
                    self.metrics.inc_enrichment_failures(failures as u64);
                }
                self.annotate(&mut issue, &mut explained).await;
                self.place(ns, issue, logger);
            }
            ns.pods.checked += 1;
        }

        Ok(())
    }

    async fn collect_deployments(
        &self,
        ns: &mut NamespaceReport,
        correlator: &EventCorrelator,
        events: &[EventRecord],
        logger: &StructuredLogger,
    ) -> Result<(), FetchError> {
        let deployments = self.fetcher.list_deployments(&ns.namespace).await?;
        let mut explained = 0;

        for deployment in &deployments {
            if let Some(mut issue) = classify_deployment(deployment) {
                enrich::attach_events(&mut issue, correlator, events, self.config.max_events);
                self.annotate(&mut issue, &mut explained).await;
                self.place(ns, issue, logger);
            }
            ns.deployments.checked += 1;
        }

        Ok(())
    }

    async fn collect_services(
        &self,
        ns: &mut NamespaceReport,
        correlator: &EventCorrelator,
        events: &[EventRecord],
        logger: &StructuredLogger,
    ) -> Result<(), FetchError> {
        let services = self.fetcher.list_services(&ns.namespace).await?;
        let mut explained = 0;

        for service in &services {
            if classify::is_skipped(service) {
                continue;
            }

            let endpoint_count = match self
                .fetcher
                .get_endpoints(&ns.namespace, &service.name)
                .await
            {
                Ok(endpoints) => Ok(endpoints.address_count()),
                // A missing endpoints object means nothing backs the service
                Err(e) if e.is_not_found() => Ok(0),
                Err(e) => Err(e),
            };

            let issue = match endpoint_count {
                Ok(0) => {
                    let matching = match self
                        .fetcher
                        .list_pods_matching(&ns.namespace, &service.selector)
                        .await
                    {
                        Ok(pods) => Some(pods),
                        Err(e) => {
                            debug!(namespace = %ns.namespace, service = %service.name, error = %e, "Matching pods lookup failed");
                            self.metrics.inc_enrichment_failures(1);
                            None
                        }
                    };
                    classify_service(service, 0, matching.as_deref())
                }
                Ok(count) => classify_service(service, count, None),
                Err(e) => Some(classify::endpoints_unavailable(service, &e.to_string())),
            };

            if let Some(mut issue) = issue {
                enrich::attach_events(&mut issue, correlator, events, self.config.max_events);
                self.annotate(&mut issue, &mut explained).await;
                self.place(ns, issue, logger);
            }
            ns.services.checked += 1;
        }

        Ok(())
    }

    /// Attach explanation and fix text, up to the per-kind limit
    async fn annotate(&self, issue: &mut Issue, explained: &mut usize) {
        let Some(explainer) = &self.explainer else {
            return;
        };
        if *explained >= self.config.max_explained_items {
            return;
        }
        *explained += 1;

        match explainer.explain(&prompt::issue_prompt(issue)).await {
            Ok(text) => issue.explanation = Some(text),
            Err(e) => {
                warn!(kind = %issue.kind, name = %issue.name, error = %e, "Explanation failed");
                self.metrics.inc_explanation_failures();
            }
        }

        if self.config.generate_fixes {
            match explainer.explain(&prompt::fix_prompt(issue)).await {
                Ok(text) => issue.suggested_fix = Some(text),
                Err(e) => {
                    warn!(kind = %issue.kind, name = %issue.name, error = %e, "Fix suggestion failed");
                    self.metrics.inc_explanation_failures();
                }
            }
        }
    }

    fn place(&self, ns: &mut NamespaceReport, issue: Issue, logger: &StructuredLogger) {
        logger.log_issue(&issue);
        self.metrics.inc_issues(issue.kind.as_str());
        ns.section_mut(issue.kind).issues.push(issue);
    }

    fn record_failure(
        &self,
        ns: &mut NamespaceReport,
        section: ReportSection,
        error: &FetchError,
        logger: &StructuredLogger,
    ) {
        ns.record_error(section, error.to_string());
        if let Some(recorded) = ns.errors.last() {
            logger.log_collection_failed(recorded);
        }
        self.metrics.inc_collection_failures(section.as_str());
    }
}
