use super::Reconciler;
use crate::catalog::CatalogError;
use crate::errors::{ImportError, Result};
use crate::poll::{PollOutcome, poll_until_ready};
use crate::report::{FailureScope, ImportReport};
use crate::resolver::NameIndex;
use crate::types::{Portfolio, PortfolioId, Product, ProductId};
use tracing::{debug, info};

impl Reconciler<'_> {
    pub(super) async fn reconcile_products(
        &self,
        shared_id: &PortfolioId,
        local: &Portfolio,
        report: &mut ImportReport,
    ) -> Result<()> {
        let shared = self.catalog.search_products(Some(shared_id)).await?;
        let existing = self.catalog.search_products(None).await?;
        debug!(
            portfolio = %local.display_name,
            shared = shared.len(),
            local = existing.len(),
            "Reconciling products"
        );

        let mut index = NameIndex::build(existing, |p: &Product| p.name.as_str());
        for product in &shared {
            let outcome = self.reconcile_product(product, local, &mut index, report).await;
            let scope = FailureScope::Product {
                portfolio: local.display_name.clone(),
                product: product.name.clone(),
            };
            self.settle(outcome, scope, report)?;
        }
        Ok(())
    }

    async fn reconcile_product(
        &self,
        shared: &Product,
        local: &Portfolio,
        index: &mut NameIndex<Product>,
        report: &mut ImportReport,
    ) -> Result<()> {
        let product_id: ProductId = match index.get(&shared.name) {
            Some(existing) => {
                debug!(
                    product = %shared.name,
                    local_id = %existing.product_id,
                    "Reusing local product"
                );
                report.counters.products_reused += 1;
                existing.product_id.clone()
            }
            None => {
                let copied = self.copy_and_wait(shared).await?;
                report.counters.products_copied += 1;
                index
                    .insert(shared.name.clone(), copied)
                    .product_id
                    .clone()
            }
        };

        self.catalog
            .associate_product(&product_id, &local.id, &self.options.accept_language)
            .await?;
        info!(
            product = %shared.name,
            product_id = %product_id,
            portfolio = %local.display_name,
            "Associated product with portfolio"
        );
        report.counters.products_associated += 1;

        self.reconcile_launch_constraint(&local.id, &product_id, report)
            .await
    }

    /// Copy a shared product and wait until the copy shows up by name.
    async fn copy_and_wait(&self, shared: &Product) -> Result<Product> {
        let token = self
            .catalog
            .copy_product(&shared.arn, &self.options.accept_language)
            .await?;
        info!(
            product = %shared.name,
            source_arn = %shared.arn,
            copy_token = %token,
            "Started product copy"
        );

        let catalog = self.catalog;
        let name = shared.name.as_str();
        let outcome = poll_until_ready(name, &self.options.poll, move || async move {
            let products = catalog.search_products(None).await?;
            Ok::<_, CatalogError>(products.into_iter().find(|p| p.name == name))
        })
        .await?;

        match outcome {
            PollOutcome::Ready { value, .. } => Ok(value),
            PollOutcome::Exhausted { attempts } => Err(ImportError::CopyNotVisible {
                product: shared.name.clone(),
                attempts,
            }),
        }
    }
}
