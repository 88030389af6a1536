use super::Reconciler;
use crate::errors::Result;
use crate::report::ImportReport;
use crate::types::{NewConstraint, PortfolioId, ProductId};
use tracing::{debug, info};

impl Reconciler<'_> {
    /// Ensure one `LAUNCH` constraint exists for the pair.
    ///
    /// An existing one is left as is, even if its role differs.
    pub(super) async fn reconcile_launch_constraint(
        &self,
        portfolio_id: &PortfolioId,
        product_id: &ProductId,
        report: &mut ImportReport,
    ) -> Result<()> {
        let constraints = self
            .catalog
            .list_constraints(portfolio_id, product_id)
            .await?;
        if let Some(existing) = constraints.iter().find(|c| c.is_launch()) {
            debug!(
                %portfolio_id,
                %product_id,
                constraint_id = %existing.constraint_id,
                "Launch constraint already present"
            );
            report.counters.constraints_skipped += 1;
            return Ok(());
        }

        let constraint = NewConstraint::launch(
            portfolio_id,
            product_id,
            &self.options.targets.launch_parameters,
        );
        let constraint_id = self.catalog.create_constraint(&constraint).await?;
        info!(
            %portfolio_id,
            %product_id,
            %constraint_id,
            "Created launch constraint"
        );
        report.counters.constraints_created += 1;
        Ok(())
    }
}
