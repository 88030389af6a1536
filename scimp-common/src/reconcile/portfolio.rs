use super::Reconciler;
use crate::errors::Result;
use crate::report::{FailureScope, ImportReport};
use crate::resolver::NameIndex;
use crate::types::{NewPortfolio, Portfolio, ShareType};
use tracing::{debug, info};

impl Reconciler<'_> {
    pub(super) async fn reconcile_portfolios(
        &self,
        share_type: ShareType,
        report: &mut ImportReport,
    ) -> Result<()> {
        let shared = self
            .catalog
            .list_accepted_portfolio_shares(share_type)
            .await?;
        let local = self.catalog.list_portfolios().await?;
        info!(
            %share_type,
            shared = shared.len(),
            local = local.len(),
            "Reconciling shared portfolios"
        );

        let mut index = NameIndex::build(local, |p: &Portfolio| p.display_name.as_str());
        for portfolio in &shared {
            let outcome = self.reconcile_portfolio(portfolio, &mut index, report).await;
            let scope = FailureScope::Portfolio {
                portfolio: portfolio.display_name.clone(),
            };
            self.settle(outcome, scope, report)?;
        }
        Ok(())
    }

    async fn reconcile_portfolio(
        &self,
        shared: &Portfolio,
        index: &mut NameIndex<Portfolio>,
        report: &mut ImportReport,
    ) -> Result<()> {
        let detail = self.catalog.describe_portfolio(&shared.id).await?;
        let local = self.resolve_local(&detail, index, report).await?;

        self.associate_principal(&local, report).await?;
        self.reconcile_products(&shared.id, &local, report).await
    }

    /// Reuse the local portfolio with the same display name, or create one.
    async fn resolve_local(
        &self,
        shared: &Portfolio,
        index: &mut NameIndex<Portfolio>,
        report: &mut ImportReport,
    ) -> Result<Portfolio> {
        if let Some(existing) = index.get(&shared.display_name) {
            debug!(
                name = %shared.display_name,
                local_id = %existing.id,
                "Local portfolio already exists"
            );
            report.counters.portfolios_reused += 1;
            return Ok(existing.clone());
        }

        let created = self
            .catalog
            .create_portfolio(
                &NewPortfolio::mirror_of(shared),
                &self.options.accept_language,
            )
            .await?;
        info!(
            name = %shared.display_name,
            shared_id = %shared.id,
            local_id = %created.id,
            "Created local portfolio"
        );
        report.counters.portfolios_created += 1;

        Ok(index
            .insert(shared.display_name.clone(), created)
            .clone())
    }
}
