//! Namespace diagnosis command

use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use triage_lib::{Diagnostician, KindSelection, ResourceFetcher, Scope};

use super::Session;
use crate::explainer;
use crate::output::{emit_report, print_info, print_warning};

#[derive(Debug, Clone, Default, Args)]
pub struct DiagnoseArgs {
    /// Skip pods
    #[arg(long)]
    pub no_pods: bool,

    /// Skip deployments
    #[arg(long)]
    pub no_deployments: bool,

    /// Skip services
    #[arg(long)]
    pub no_services: bool,

    /// Skip the namespace warning events section
    #[arg(long)]
    pub no_events: bool,

    /// Only check pods
    #[arg(long, conflicts_with_all = ["no_pods", "no_deployments", "no_services"])]
    pub pods_only: bool,

    /// Maximum issues per resource kind sent for analysis
    #[arg(long)]
    pub max_items: Option<usize>,
}

impl DiagnoseArgs {
    pub fn kinds(&self) -> KindSelection {
        if self.pods_only {
            return KindSelection {
                pods: true,
                deployments: false,
                services: false,
                events: !self.no_events,
            };
        }
        KindSelection {
            pods: !self.no_pods,
            deployments: !self.no_deployments,
            services: !self.no_services,
            events: !self.no_events,
        }
    }
}

/// Diagnose one namespace and emit the report
pub async fn run(
    fetcher: Arc<dyn ResourceFetcher>,
    namespace: Option<String>,
    args: &DiagnoseArgs,
    session: &Session,
) -> Result<()> {
    let namespace = namespace.unwrap_or_else(|| fetcher.default_namespace());

    if session.is_interactive() {
        print_info(&format!("Diagnosing namespace {}...", namespace));
    }

    let explainer = explainer::from_settings(&session.config.explainer);
    let report = Diagnostician::new(fetcher, session.config.clone())
        .with_kinds(args.kinds())
        .with_explainer(explainer)
        .run(Scope::Namespace(namespace))
        .await;

    if report.partial && session.is_interactive() {
        print_warning(&format!(
            "Diagnosis did not finish within {}s; results are partial",
            session.config.timeout_secs
        ));
    }

    emit_report(
        &report,
        session.format,
        session.render_options(),
        session.destination(),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_selection_checks_everything() {
        assert_eq!(DiagnoseArgs::default().kinds(), KindSelection::all());
    }

    #[test]
    fn test_pods_only_keeps_events() {
        let args = DiagnoseArgs {
            pods_only: true,
            ..Default::default()
        };
        let kinds = args.kinds();
        assert!(kinds.pods);
        assert!(!kinds.deployments);
        assert!(!kinds.services);
        assert!(kinds.events);
    }

    #[test]
    fn test_individual_skips() {
        let args = DiagnoseArgs {
            no_services: true,
            no_events: true,
            ..Default::default()
        };
        let kinds = args.kinds();
        assert!(kinds.pods && kinds.deployments);
        assert!(!kinds.services);
        assert!(!kinds.events);
    }
}
