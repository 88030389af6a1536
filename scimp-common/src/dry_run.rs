//! Catalog wrapper that plans writes instead of issuing them.
//!
//! Reads go to the wrapped client. Writes are logged, recorded as
//! [`PlannedAction`]s and answered with synthetic ids; later reads see the
//! planned state so the rest of the pass behaves as it would for real.

use crate::catalog::{CatalogClient, CatalogError, CatalogOperation, CatalogResult};
use crate::types::{
    ConstraintSummary, NewConstraint, NewPortfolio, Portfolio, PortfolioId, Product, ProductId,
    ShareType,
};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

const SYNTHETIC_PREFIX: &str = "dryrun";

/// A write that would have been issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedAction {
    pub operation: CatalogOperation,
    pub target: String,
    pub detail: String,
}

#[derive(Debug, Default)]
struct Planned {
    actions: Vec<PlannedAction>,
    accepted_shares: Vec<PortfolioId>,
    portfolios: Vec<Portfolio>,
    /// Products seen in scoped searches, by ARN; copy sources come from here.
    seen_by_arn: HashMap<String, Product>,
    copied: Vec<Product>,
    associations: Vec<(ProductId, PortfolioId)>,
    constraints: HashMap<(PortfolioId, ProductId), Vec<ConstraintSummary>>,
    next_id: u32,
}

impl Planned {
    fn synthetic_id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{kind}-{SYNTHETIC_PREFIX}-{:04}", self.next_id)
    }

    fn plan(&mut self, operation: CatalogOperation, target: &str, detail: String) {
        info!(%operation, resource = target, detail = %detail, "Dry run: not issuing write");
        self.actions.push(PlannedAction {
            operation,
            target: target.to_string(),
            detail,
        });
    }
}

fn is_synthetic(id: &str) -> bool {
    id.contains(&format!("-{SYNTHETIC_PREFIX}-"))
}

pub struct DryRunCatalog<C> {
    inner: C,
    planned: Mutex<Planned>,
}

impl<C: CatalogClient> DryRunCatalog<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            planned: Mutex::new(Planned::default()),
        }
    }

    fn planned(&self) -> MutexGuard<'_, Planned> {
        self.planned
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Writes planned so far, in order.
    pub fn actions(&self) -> Vec<PlannedAction> {
        self.planned().actions.clone()
    }
}

#[async_trait]
impl<C: CatalogClient> CatalogClient for DryRunCatalog<C> {
    async fn list_accepted_portfolio_shares(
        &self,
        share_type: ShareType,
    ) -> CatalogResult<Vec<Portfolio>> {
        let mut shares = self.inner.list_accepted_portfolio_shares(share_type).await?;
        if share_type != ShareType::Imported {
            return Ok(shares);
        }

        let accepted = self.planned().accepted_shares.clone();
        for id in accepted {
            if !shares.iter().any(|p| p.id == id) {
                shares.push(self.inner.describe_portfolio(&id).await?);
            }
        }
        Ok(shares)
    }

    async fn list_portfolios(&self) -> CatalogResult<Vec<Portfolio>> {
        let mut portfolios = self.inner.list_portfolios().await?;
        portfolios.extend(self.planned().portfolios.iter().cloned());
        Ok(portfolios)
    }

    async fn describe_portfolio(&self, id: &PortfolioId) -> CatalogResult<Portfolio> {
        if is_synthetic(id.as_str()) {
            let planned = self.planned();
            return planned
                .portfolios
                .iter()
                .find(|p| &p.id == id)
                .cloned()
                .ok_or_else(|| {
                    CatalogError::new(CatalogOperation::DescribePortfolio, "unknown planned portfolio")
                });
        }
        self.inner.describe_portfolio(id).await
    }

    async fn create_portfolio(
        &self,
        portfolio: &NewPortfolio,
        _accept_language: &str,
    ) -> CatalogResult<Portfolio> {
        let mut planned = self.planned();
        let created = Portfolio {
            id: PortfolioId::new(planned.synthetic_id("port")),
            display_name: portfolio.display_name.clone(),
            description: portfolio.description.clone(),
            provider_name: portfolio.provider_name.clone(),
        };
        planned.plan(
            CatalogOperation::CreatePortfolio,
            &portfolio.display_name,
            format!("provider '{}', id {}", portfolio.provider_name, created.id),
        );
        planned.portfolios.push(created.clone());
        Ok(created)
    }

    async fn associate_principal(
        &self,
        portfolio_id: &PortfolioId,
        principal_arn: &str,
    ) -> CatalogResult<()> {
        self.planned().plan(
            CatalogOperation::AssociatePrincipal,
            portfolio_id.as_str(),
            principal_arn.to_string(),
        );
        Ok(())
    }

    async fn search_products(
        &self,
        portfolio_id: Option<&PortfolioId>,
    ) -> CatalogResult<Vec<Product>> {
        match portfolio_id {
            Some(id) if is_synthetic(id.as_str()) => {
                let planned = self.planned();
                Ok(planned
                    .associations
                    .iter()
                    .filter(|(_, portfolio)| portfolio == id)
                    .filter_map(|(product, _)| {
                        planned
                            .copied
                            .iter()
                            .find(|p| &p.product_id == product)
                            .cloned()
                    })
                    .collect())
            }
            Some(id) => {
                let products = self.inner.search_products(Some(id)).await?;
                let mut planned = self.planned();
                for product in &products {
                    planned
                        .seen_by_arn
                        .insert(product.arn.clone(), product.clone());
                }
                Ok(products)
            }
            None => {
                let mut products = self.inner.search_products(None).await?;
                products.extend(self.planned().copied.iter().cloned());
                Ok(products)
            }
        }
    }

    async fn copy_product(&self, source_arn: &str, _accept_language: &str) -> CatalogResult<String> {
        let mut planned = self.planned();
        let source = planned.seen_by_arn.get(source_arn).cloned().ok_or_else(|| {
            CatalogError::new(
                CatalogOperation::CopyProduct,
                format!("source product {source_arn} was not seen in a portfolio search"),
            )
        })?;

        let product_id = planned.synthetic_id("prod");
        let token = planned.synthetic_id("copy");
        planned.plan(
            CatalogOperation::CopyProduct,
            source_arn,
            format!("'{}' as {product_id}", source.name),
        );
        planned.copied.push(Product {
            arn: format!("{source_arn}/{product_id}"),
            product_id: ProductId::new(product_id),
            name: source.name,
        });
        Ok(token)
    }

    async fn associate_product(
        &self,
        product_id: &ProductId,
        portfolio_id: &PortfolioId,
        _accept_language: &str,
    ) -> CatalogResult<()> {
        let mut planned = self.planned();
        planned.plan(
            CatalogOperation::AssociateProduct,
            product_id.as_str(),
            format!("with portfolio {portfolio_id}"),
        );
        planned
            .associations
            .push((product_id.clone(), portfolio_id.clone()));
        Ok(())
    }

    async fn list_constraints(
        &self,
        portfolio_id: &PortfolioId,
        product_id: &ProductId,
    ) -> CatalogResult<Vec<ConstraintSummary>> {
        let key = (portfolio_id.clone(), product_id.clone());
        let mut constraints =
            if is_synthetic(portfolio_id.as_str()) || is_synthetic(product_id.as_str()) {
                Vec::new()
            } else {
                self.inner.list_constraints(portfolio_id, product_id).await?
            };
        if let Some(planned) = self.planned().constraints.get(&key) {
            constraints.extend(planned.iter().cloned());
        }
        Ok(constraints)
    }

    async fn create_constraint(&self, constraint: &NewConstraint) -> CatalogResult<String> {
        let mut planned = self.planned();
        let constraint_id = planned.synthetic_id("cons");
        planned.plan(
            CatalogOperation::CreateConstraint,
            constraint.product_id.as_str(),
            format!(
                "{} on portfolio {} with {}",
                constraint.kind, constraint.portfolio_id, constraint.parameters
            ),
        );
        planned
            .constraints
            .entry((constraint.portfolio_id.clone(), constraint.product_id.clone()))
            .or_default()
            .push(ConstraintSummary {
                constraint_id: constraint_id.clone(),
                kind: constraint.kind.clone(),
            });
        Ok(constraint_id)
    }

    async fn accept_portfolio_share(&self, portfolio_id: &PortfolioId) -> CatalogResult<()> {
        let mut planned = self.planned();
        planned.plan(
            CatalogOperation::AcceptPortfolioShare,
            portfolio_id.as_str(),
            String::new(),
        );
        planned.accepted_shares.push(portfolio_id.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCatalog;

    fn hub_portfolio() -> Portfolio {
        Portfolio {
            id: PortfolioId::new("port-hub-1"),
            display_name: "Net-Ops".to_string(),
            description: String::new(),
            provider_name: "CentralIT".to_string(),
        }
    }

    fn hub_product() -> Product {
        Product {
            product_id: ProductId::new("prod-hub-1"),
            name: "VPC-Baseline".to_string(),
            arn: "arn:aws:catalog:us-east-1:999999999999:product/prod-hub-1".to_string(),
        }
    }

    fn wrapped() -> DryRunCatalog<MockCatalog> {
        DryRunCatalog::new(
            MockCatalog::builder()
                .shared_portfolio(
                    ShareType::AwsOrganizations,
                    hub_portfolio(),
                    vec![hub_product()],
                )
                .build(),
        )
    }

    #[tokio::test]
    async fn test_writes_never_reach_inner_client() {
        let catalog = wrapped();
        let new = NewPortfolio::mirror_of(&hub_portfolio());
        let created = catalog.create_portfolio(&new, "en").await.unwrap();
        assert!(created.id.as_str().starts_with("port-dryrun-"));

        catalog
            .associate_principal(&created.id, "arn:aws:iam::111122223333:role/SCEndUser")
            .await
            .unwrap();

        assert_eq!(catalog.inner.mutation_count(), 0);
        assert_eq!(catalog.actions().len(), 2);
        assert_eq!(catalog.actions()[0].operation, CatalogOperation::CreatePortfolio);
    }

    #[tokio::test]
    async fn test_planned_state_visible_to_reads() {
        let catalog = wrapped();
        let created = catalog
            .create_portfolio(&NewPortfolio::mirror_of(&hub_portfolio()), "en")
            .await
            .unwrap();
        let local = catalog.list_portfolios().await.unwrap();
        assert_eq!(local, vec![created.clone()]);

        catalog
            .search_products(Some(&hub_portfolio().id))
            .await
            .unwrap();
        catalog.copy_product(&hub_product().arn, "en").await.unwrap();
        let visible = catalog.search_products(None).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "VPC-Baseline");

        let constraint = NewConstraint::launch(&created.id, &visible[0].product_id, "{}");
        catalog.create_constraint(&constraint).await.unwrap();
        let listed = catalog
            .list_constraints(&created.id, &visible[0].product_id)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_launch());
    }

    #[tokio::test]
    async fn test_copy_of_unseen_product_fails() {
        let catalog = wrapped();
        let err = catalog
            .copy_product("arn:aws:catalog:::product/unknown", "en")
            .await
            .unwrap_err();
        assert_eq!(err.operation, CatalogOperation::CopyProduct);
    }
}
