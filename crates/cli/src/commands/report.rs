//! Health report command

use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use triage_lib::{Diagnostician, ResourceFetcher, Scope};

use super::Session;
use crate::explainer;
use crate::output::{emit_report, print_info, print_warning};

#[derive(Debug, Clone, Default, Args)]
pub struct ReportArgs {
    /// Report on every namespace in the cluster
    #[arg(long, short = 'A')]
    pub all_namespaces: bool,

    /// List namespaces without issues in cluster reports
    #[arg(long)]
    pub include_healthy: bool,
}

/// Choose the report scope from the flags and the requested namespace
pub fn scope(args: &ReportArgs, namespace: Option<String>, default_namespace: String) -> Scope {
    if args.all_namespaces {
        Scope::AllNamespaces
    } else {
        Scope::Namespace(namespace.unwrap_or(default_namespace))
    }
}

/// Build a health report and emit it
pub async fn run(
    fetcher: Arc<dyn ResourceFetcher>,
    namespace: Option<String>,
    args: &ReportArgs,
    session: &Session,
) -> Result<()> {
    let scope = scope(args, namespace, fetcher.default_namespace());

    if session.is_interactive() {
        let target = match &scope {
            Scope::AllNamespaces => "all namespaces".to_string(),
            Scope::Namespace(ns) => format!("namespace {}", ns),
        };
        print_info(&format!("Generating health report for {}...", target));
    }

    let explainer = explainer::from_settings(&session.config.explainer);
    let report = Diagnostician::new(fetcher, session.config.clone())
        .with_explainer(explainer)
        .run(scope)
        .await;

    if report.partial && session.is_interactive() {
        print_warning(&format!(
            "Report did not finish within {}s; results are partial",
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
    fn test_scope_selection() {
        let all = ReportArgs {
            all_namespaces: true,
            ..Default::default()
        };
        assert_eq!(
            scope(&all, Some("shop".to_string()), "default".to_string()),
            Scope::AllNamespaces
        );

        let single = ReportArgs::default();
        assert_eq!(
            scope(&single, None, "default".to_string()),
            Scope::Namespace("default".to_string())
        );
        assert_eq!(
            scope(&single, Some("shop".to_string()), "default".to_string()),
            Scope::Namespace("shop".to_string())
        );
    }
}
