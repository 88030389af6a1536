use super::Reconciler;
use crate::errors::Result;
use crate::report::ImportReport;
use crate::types::Portfolio;
use tracing::info;

impl Reconciler<'_> {
    /// Grant the configured principal access. Issued on every pass.
    pub(super) async fn associate_principal(
        &self,
        portfolio: &Portfolio,
        report: &mut ImportReport,
    ) -> Result<()> {
        let principal_arn = &self.options.targets.principal_arn;
        self.catalog
            .associate_principal(&portfolio.id, principal_arn)
            .await?;
        info!(
            portfolio = %portfolio.display_name,
            portfolio_id = %portfolio.id,
            %principal_arn,
            "Associated principal"
        );
        report.counters.principals_associated += 1;
        Ok(())
    }
}
