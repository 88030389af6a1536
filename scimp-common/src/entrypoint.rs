//! One import, from raw notification to finished report.

use crate::catalog::{CatalogClient, IdentityClient};
use crate::config::ImporterConfig;
use crate::errors::Result;
use crate::event::{ShareDecision, classify_share, parse_notification};
use crate::reconcile::{ReconcileOptions, Reconciler};
use crate::report::ImportReport;
use crate::types::ImportTargets;
use tracing::info;

/// Everything one invocation needs.
pub struct Invocation<'a> {
    pub catalog: &'a dyn CatalogClient,
    pub identity: &'a dyn IdentityClient,
    pub config: &'a ImporterConfig,
    pub dry_run: bool,
}

impl<'a> Invocation<'a> {
    pub fn new(
        catalog: &'a dyn CatalogClient,
        identity: &'a dyn IdentityClient,
        config: &'a ImporterConfig,
    ) -> Self {
        Self {
            catalog,
            identity,
            config,
            dry_run: false,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the import and return its report.
    ///
    /// Failures recorded in continue-on-error mode stay in the report; use
    /// [`ImportReport::into_result`] to turn them into an error.
    pub async fn execute(&self, payload: &serde_json::Value) -> Result<ImportReport> {
        let account_id = self.identity.current_account().await?;
        let targets = ImportTargets::for_account(
            &self.config.partition.value,
            &account_id,
            &self.config.principal_role_name.value,
            &self.config.launch_role_name.value,
        );

        let event = parse_notification(payload)?;
        let decision = classify_share(&event, &account_id)?;

        let mut report = ImportReport::new(decision.share_type());
        report.dry_run = self.dry_run;
        info!(
            invocation_id = %report.invocation_id,
            %account_id,
            event_name = %event.event_name,
            share_type = %report.share_type,
            failure_mode = %self.config.failure_mode(),
            dry_run = self.dry_run,
            "Starting portfolio import"
        );

        if let ShareDecision::DirectShare { portfolio_id } = &decision {
            self.catalog.accept_portfolio_share(portfolio_id).await?;
            info!(%portfolio_id, "Accepted portfolio share");
            report.counters.shares_accepted += 1;
        }

        let mut options = ReconcileOptions::from_config(self.config, targets);
        if self.dry_run {
            // Planned copies are visible on the next search.
            options.poll = options.poll.without_delay();
        }
        Reconciler::new(self.catalog, &options)
            .run(decision.share_type(), &mut report)
            .await?;

        report.finish();
        report.log_summary();
        Ok(report)
    }
}

/// Run an import; any recorded failure fails the call.
pub async fn run_import(
    catalog: &dyn CatalogClient,
    identity: &dyn IdentityClient,
    config: &ImporterConfig,
    payload: &serde_json::Value,
) -> Result<ImportReport> {
    let outcome = Invocation::new(catalog, identity, config)
        .execute(payload)
        .await
        .and_then(ImportReport::into_result);

    if let Err(err) = &outcome {
        err.log();
    }
    outcome
}
