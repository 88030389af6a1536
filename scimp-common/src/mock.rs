//! In-memory catalog and identity services for tests.
//!
//! The mock keeps hub-side shares and local state apart the way the real
//! service does: shared portfolios and their products are only reachable
//! through share listings and scoped searches, copies land in the local
//! account and become searchable after a configurable number of searches.

use crate::catalog::{
    CatalogClient, CatalogError, CatalogOperation, CatalogResult, IdentityClient,
};
use crate::types::{
    ConstraintSummary, NewConstraint, NewPortfolio, Portfolio, PortfolioId, Product, ProductId,
    ShareType,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// One recorded call against [`MockCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    ListAcceptedPortfolioShares {
        share_type: ShareType,
    },
    ListPortfolios,
    DescribePortfolio {
        portfolio_id: PortfolioId,
    },
    CreatePortfolio {
        portfolio: NewPortfolio,
        accept_language: String,
    },
    AssociatePrincipal {
        portfolio_id: PortfolioId,
        principal_arn: String,
    },
    SearchProducts {
        portfolio_id: Option<PortfolioId>,
    },
    CopyProduct {
        source_arn: String,
        accept_language: String,
    },
    AssociateProduct {
        product_id: ProductId,
        portfolio_id: PortfolioId,
        accept_language: String,
    },
    ListConstraints {
        portfolio_id: PortfolioId,
        product_id: ProductId,
    },
    CreateConstraint {
        constraint: NewConstraint,
    },
    AcceptPortfolioShare {
        portfolio_id: PortfolioId,
    },
}

impl CatalogCall {
    pub fn operation(&self) -> CatalogOperation {
        match self {
            Self::ListAcceptedPortfolioShares { .. } => CatalogOperation::ListAcceptedPortfolioShares,
            Self::ListPortfolios => CatalogOperation::ListPortfolios,
            Self::DescribePortfolio { .. } => CatalogOperation::DescribePortfolio,
            Self::CreatePortfolio { .. } => CatalogOperation::CreatePortfolio,
            Self::AssociatePrincipal { .. } => CatalogOperation::AssociatePrincipal,
            Self::SearchProducts { .. } => CatalogOperation::SearchProductsAsAdmin,
            Self::CopyProduct { .. } => CatalogOperation::CopyProduct,
            Self::AssociateProduct { .. } => CatalogOperation::AssociateProduct,
            Self::ListConstraints { .. } => CatalogOperation::ListConstraints,
            Self::CreateConstraint { .. } => CatalogOperation::CreateConstraint,
            Self::AcceptPortfolioShare { .. } => CatalogOperation::AcceptPortfolioShare,
        }
    }

    /// Primary identifier the call acts on, used to target injected failures.
    fn target(&self) -> Option<&str> {
        match self {
            Self::ListAcceptedPortfolioShares { .. } | Self::ListPortfolios => None,
            Self::DescribePortfolio { portfolio_id }
            | Self::AssociatePrincipal { portfolio_id, .. }
            | Self::AcceptPortfolioShare { portfolio_id } => Some(portfolio_id.as_str()),
            Self::CreatePortfolio { portfolio, .. } => Some(portfolio.display_name.as_str()),
            Self::SearchProducts { portfolio_id } => portfolio_id.as_ref().map(|id| id.as_str()),
            Self::CopyProduct { source_arn, .. } => Some(source_arn.as_str()),
            Self::AssociateProduct { product_id, .. }
            | Self::ListConstraints { product_id, .. } => Some(product_id.as_str()),
            Self::CreateConstraint { constraint } => Some(constraint.product_id.as_str()),
        }
    }
}

#[derive(Debug, Clone)]
struct FailureRule {
    operation: CatalogOperation,
    target: Option<String>,
    message: String,
}

#[derive(Debug, Clone)]
struct PendingCopy {
    product: Product,
    searches_left: usize,
}

#[derive(Debug, Default)]
struct MockState {
    /// Portfolios in the hub account, by id.
    hub_portfolios: HashMap<PortfolioId, Portfolio>,
    hub_products: HashMap<PortfolioId, Vec<Product>>,
    /// Shares visible to this account, in listing order.
    shares: Vec<(ShareType, PortfolioId)>,
    /// Direct shares not yet accepted.
    pending_shares: Vec<PortfolioId>,

    local_portfolios: Vec<Portfolio>,
    local_products: Vec<Product>,
    pending_copies: Vec<PendingCopy>,
    product_associations: Vec<(ProductId, PortfolioId)>,
    principal_associations: Vec<(PortfolioId, String)>,
    constraints: HashMap<(PortfolioId, ProductId), Vec<ConstraintSummary>>,

    copy_visibility_delay: usize,
    failures: Vec<FailureRule>,
    calls: Vec<CatalogCall>,
    next_id: u32,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:04}", self.next_id)
    }

    /// Record the call, then fail it if a rule matches.
    fn record(&mut self, call: CatalogCall) -> CatalogResult<()> {
        let operation = call.operation();
        let failure = self.failures.iter().find(|rule| {
            rule.operation == operation
                && rule
                    .target
                    .as_deref()
                    .is_none_or(|target| call.target() == Some(target))
        });
        let result = match failure {
            Some(rule) => Err(CatalogError::new(operation, rule.message.clone())),
            None => Ok(()),
        };
        self.calls.push(call);
        result
    }

    fn find_portfolio(&self, id: &PortfolioId) -> Option<&Portfolio> {
        self.hub_portfolios
            .get(id)
            .or_else(|| self.local_portfolios.iter().find(|p| &p.id == id))
    }

    fn settle_copies(&mut self) {
        let mut still_pending = Vec::new();
        for mut copy in self.pending_copies.drain(..) {
            if copy.searches_left == 0 {
                self.local_products.push(copy.product);
            } else {
                copy.searches_left -= 1;
                still_pending.push(copy);
            }
        }
        self.pending_copies = still_pending;
    }
}

#[derive(Debug, Default)]
pub struct MockCatalog {
    state: Mutex<MockState>,
}

impl MockCatalog {
    pub fn builder() -> MockCatalogBuilder {
        MockCatalogBuilder::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<CatalogCall> {
        self.state().calls.clone()
    }

    pub fn count(&self, operation: CatalogOperation) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.operation() == operation)
            .count()
    }

    /// Number of calls that changed state.
    pub fn mutation_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| call.operation().is_mutation())
            .count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn local_portfolios(&self) -> Vec<Portfolio> {
        self.state().local_portfolios.clone()
    }

    pub fn local_products(&self) -> Vec<Product> {
        self.state().local_products.clone()
    }

    pub fn product_associations(&self) -> Vec<(ProductId, PortfolioId)> {
        self.state().product_associations.clone()
    }

    pub fn principal_associations(&self) -> Vec<(PortfolioId, String)> {
        self.state().principal_associations.clone()
    }

    pub fn constraints(
        &self,
        portfolio_id: &PortfolioId,
        product_id: &ProductId,
    ) -> Vec<ConstraintSummary> {
        self.state()
            .constraints
            .get(&(portfolio_id.clone(), product_id.clone()))
            .cloned()
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct MockCatalogBuilder {
    state: MockState,
}

impl MockCatalogBuilder {
    /// A portfolio shared with this account, with the products it holds.
    pub fn shared_portfolio(
        mut self,
        share_type: ShareType,
        portfolio: Portfolio,
        products: Vec<Product>,
    ) -> Self {
        self.state.shares.push((share_type, portfolio.id.clone()));
        self.hub_entry(portfolio, products)
    }

    /// A direct share that only shows up once accepted.
    pub fn pending_share(mut self, portfolio: Portfolio, products: Vec<Product>) -> Self {
        self.state.pending_shares.push(portfolio.id.clone());
        self.hub_entry(portfolio, products)
    }

    fn hub_entry(mut self, portfolio: Portfolio, products: Vec<Product>) -> Self {
        self.state
            .hub_products
            .insert(portfolio.id.clone(), products);
        self.state
            .hub_portfolios
            .insert(portfolio.id.clone(), portfolio);
        self
    }

    pub fn local_portfolio(mut self, portfolio: Portfolio) -> Self {
        self.state.local_portfolios.push(portfolio);
        self
    }

    pub fn local_product(mut self, product: Product) -> Self {
        self.state.local_products.push(product);
        self
    }

    pub fn constraint(mut self, portfolio_id: &str, product_id: &str, kind: &str) -> Self {
        let id = self.state.next_id("cons");
        self.state
            .constraints
            .entry((PortfolioId::new(portfolio_id), ProductId::new(product_id)))
            .or_default()
            .push(ConstraintSummary {
                constraint_id: id,
                kind: kind.to_string(),
            });
        self
    }

    /// Unscoped searches that still miss a fresh copy.
    pub fn copy_visibility_delay(mut self, searches: usize) -> Self {
        self.state.copy_visibility_delay = searches;
        self
    }

    /// Fail every call of `operation`.
    pub fn fail_on(mut self, operation: CatalogOperation, message: &str) -> Self {
        self.state.failures.push(FailureRule {
            operation,
            target: None,
            message: message.to_string(),
        });
        self
    }

    /// Fail calls of `operation` acting on `target` (an id, ARN or display name).
    pub fn fail_on_target(
        mut self,
        operation: CatalogOperation,
        target: &str,
        message: &str,
    ) -> Self {
        self.state.failures.push(FailureRule {
            operation,
            target: Some(target.to_string()),
            message: message.to_string(),
        });
        self
    }

    pub fn build(self) -> MockCatalog {
        MockCatalog {
            state: Mutex::new(self.state),
        }
    }
}

fn not_found(operation: CatalogOperation, what: &str) -> CatalogError {
    CatalogError::new(operation, format!("ResourceNotFoundException: {what}"))
}

#[async_trait]
impl CatalogClient for MockCatalog {
    async fn list_accepted_portfolio_shares(
        &self,
        share_type: ShareType,
    ) -> CatalogResult<Vec<Portfolio>> {
        let mut state = self.state();
        state.record(CatalogCall::ListAcceptedPortfolioShares { share_type })?;
        Ok(state
            .shares
            .iter()
            .filter(|(kind, _)| *kind == share_type)
            .filter_map(|(_, id)| state.hub_portfolios.get(id).cloned())
            .collect())
    }

    async fn list_portfolios(&self) -> CatalogResult<Vec<Portfolio>> {
        let mut state = self.state();
        state.record(CatalogCall::ListPortfolios)?;
        Ok(state.local_portfolios.clone())
    }

    async fn describe_portfolio(&self, id: &PortfolioId) -> CatalogResult<Portfolio> {
        let mut state = self.state();
        state.record(CatalogCall::DescribePortfolio {
            portfolio_id: id.clone(),
        })?;
        state
            .find_portfolio(id)
            .cloned()
            .ok_or_else(|| not_found(CatalogOperation::DescribePortfolio, id.as_str()))
    }

    async fn create_portfolio(
        &self,
        portfolio: &NewPortfolio,
        accept_language: &str,
    ) -> CatalogResult<Portfolio> {
        let mut state = self.state();
        state.record(CatalogCall::CreatePortfolio {
            portfolio: portfolio.clone(),
            accept_language: accept_language.to_string(),
        })?;
        let created = Portfolio {
            id: PortfolioId::new(state.next_id("port-local")),
            display_name: portfolio.display_name.clone(),
            description: portfolio.description.clone(),
            provider_name: portfolio.provider_name.clone(),
        };
        state.local_portfolios.push(created.clone());
        Ok(created)
    }

    async fn associate_principal(
        &self,
        portfolio_id: &PortfolioId,
        principal_arn: &str,
    ) -> CatalogResult<()> {
        let mut state = self.state();
        state.record(CatalogCall::AssociatePrincipal {
            portfolio_id: portfolio_id.clone(),
            principal_arn: principal_arn.to_string(),
        })?;
        let entry = (portfolio_id.clone(), principal_arn.to_string());
        if !state.principal_associations.contains(&entry) {
            state.principal_associations.push(entry);
        }
        Ok(())
    }

    async fn search_products(
        &self,
        portfolio_id: Option<&PortfolioId>,
    ) -> CatalogResult<Vec<Product>> {
        let mut state = self.state();
        state.record(CatalogCall::SearchProducts {
            portfolio_id: portfolio_id.cloned(),
        })?;

        let Some(id) = portfolio_id else {
            state.settle_copies();
            return Ok(state.local_products.clone());
        };
        if let Some(products) = state.hub_products.get(id) {
            return Ok(products.clone());
        }
        Ok(state
            .product_associations
            .iter()
            .filter(|(_, portfolio)| portfolio == id)
            .filter_map(|(product, _)| {
                state
                    .local_products
                    .iter()
                    .find(|p| &p.product_id == product)
                    .cloned()
            })
            .collect())
    }

    async fn copy_product(&self, source_arn: &str, accept_language: &str) -> CatalogResult<String> {
        let mut state = self.state();
        state.record(CatalogCall::CopyProduct {
            source_arn: source_arn.to_string(),
            accept_language: accept_language.to_string(),
        })?;

        let source = state
            .hub_products
            .values()
            .flatten()
            .find(|p| p.arn == source_arn)
            .cloned()
            .ok_or_else(|| not_found(CatalogOperation::CopyProduct, source_arn))?;

        let product_id = state.next_id("prod-local");
        let copy = Product {
            arn: format!("arn:aws:catalog:us-east-1:111122223333:product/{product_id}"),
            product_id: ProductId::new(product_id),
            name: source.name,
        };
        let searches_left = state.copy_visibility_delay;
        state.pending_copies.push(PendingCopy {
            product: copy,
            searches_left,
        });
        Ok(state.next_id("copy"))
    }

    async fn associate_product(
        &self,
        product_id: &ProductId,
        portfolio_id: &PortfolioId,
        accept_language: &str,
    ) -> CatalogResult<()> {
        let mut state = self.state();
        state.record(CatalogCall::AssociateProduct {
            product_id: product_id.clone(),
            portfolio_id: portfolio_id.clone(),
            accept_language: accept_language.to_string(),
        })?;
        let entry = (product_id.clone(), portfolio_id.clone());
        if !state.product_associations.contains(&entry) {
            state.product_associations.push(entry);
        }
        Ok(())
    }

    async fn list_constraints(
        &self,
        portfolio_id: &PortfolioId,
        product_id: &ProductId,
    ) -> CatalogResult<Vec<ConstraintSummary>> {
        let mut state = self.state();
        state.record(CatalogCall::ListConstraints {
            portfolio_id: portfolio_id.clone(),
            product_id: product_id.clone(),
        })?;
        Ok(state
            .constraints
            .get(&(portfolio_id.clone(), product_id.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn create_constraint(&self, constraint: &NewConstraint) -> CatalogResult<String> {
        let mut state = self.state();
        state.record(CatalogCall::CreateConstraint {
            constraint: constraint.clone(),
        })?;
        let constraint_id = state.next_id("cons");
        state
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
        let mut state = self.state();
        state.record(CatalogCall::AcceptPortfolioShare {
            portfolio_id: portfolio_id.clone(),
        })?;
        let Some(pos) = state.pending_shares.iter().position(|id| id == portfolio_id) else {
            return Err(not_found(
                CatalogOperation::AcceptPortfolioShare,
                portfolio_id.as_str(),
            ));
        };
        let id = state.pending_shares.remove(pos);
        state.shares.push((ShareType::Imported, id));
        Ok(())
    }
}

/// Identity service answering with a fixed account.
#[derive(Debug, Clone)]
pub struct MockIdentity {
    account_id: String,
    failure: Option<String>,
}

impl MockIdentity {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            failure: None,
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            account_id: String::new(),
            failure: Some(message.into()),
        }
    }
}

#[async_trait]
impl IdentityClient for MockIdentity {
    async fn current_account(&self) -> CatalogResult<String> {
        match &self.failure {
            Some(message) => Err(CatalogError::new(
                CatalogOperation::GetCallerIdentity,
                message.clone(),
            )),
            None => Ok(self.account_id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[tokio::test]
    async fn test_copy_visible_after_delay() {
        let mock = MockCatalog::builder()
            .shared_portfolio(ShareType::AwsOrganizations, hub_portfolio(), vec![hub_product()])
            .copy_visibility_delay(2)
            .build();

        mock.copy_product(&hub_product().arn, "en").await.unwrap();
        assert!(mock.search_products(None).await.unwrap().is_empty());
        assert!(mock.search_products(None).await.unwrap().is_empty());
        let visible = mock.search_products(None).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "VPC-Baseline");
        assert_ne!(visible[0].product_id, hub_product().product_id);
    }

    #[tokio::test]
    async fn test_pending_share_listed_after_accept() {
        let mock = MockCatalog::builder()
            .pending_share(hub_portfolio(), vec![])
            .build();

        let before = mock
            .list_accepted_portfolio_shares(ShareType::Imported)
            .await
            .unwrap();
        assert!(before.is_empty());

        mock.accept_portfolio_share(&PortfolioId::new("port-hub-1"))
            .await
            .unwrap();
        let after = mock
            .list_accepted_portfolio_shares(ShareType::Imported)
            .await
            .unwrap();
        assert_eq!(after, vec![hub_portfolio()]);
    }

    #[tokio::test]
    async fn test_targeted_failure_only_hits_target() {
        let mock = MockCatalog::builder()
            .fail_on_target(CatalogOperation::DescribePortfolio, "port-bad", "AccessDenied")
            .shared_portfolio(ShareType::AwsOrganizations, hub_portfolio(), vec![])
            .build();

        assert!(mock
            .describe_portfolio(&PortfolioId::new("port-hub-1"))
            .await
            .is_ok());
        let err = mock
            .describe_portfolio(&PortfolioId::new("port-bad"))
            .await
            .unwrap_err();
        assert_eq!(err.message, "AccessDenied");
        assert_eq!(mock.count(CatalogOperation::DescribePortfolio), 2);
    }

    #[tokio::test]
    async fn test_identity() {
        assert_eq!(
            MockIdentity::new("111122223333").current_account().await.unwrap(),
            "111122223333"
        );
        let err = MockIdentity::failing("ExpiredToken")
            .current_account()
            .await
            .unwrap_err();
        assert_eq!(err.operation, CatalogOperation::GetCallerIdentity);
    }
}
