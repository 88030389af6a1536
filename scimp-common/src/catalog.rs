//! Facade over the catalog-management and identity services.
//!
//! The reconcilers only talk to these traits. The binary provides AWS SDK
//! implementations; tests use [`crate::mock::MockCatalog`].

use crate::types::{
    ConstraintSummary, NewConstraint, NewPortfolio, Portfolio, PortfolioId, Product, ProductId,
    ShareType,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Remote operations issued by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogOperation {
    ListAcceptedPortfolioShares,
    ListPortfolios,
    DescribePortfolio,
    CreatePortfolio,
    AssociatePrincipal,
    SearchProductsAsAdmin,
    CopyProduct,
    AssociateProduct,
    ListConstraints,
    CreateConstraint,
    AcceptPortfolioShare,
    GetCallerIdentity,
}

impl CatalogOperation {
    /// API action name, as it appears in service logs.
    pub fn action(&self) -> &'static str {
        match self {
            Self::ListAcceptedPortfolioShares => "ListAcceptedPortfolioShares",
            Self::ListPortfolios => "ListPortfolios",
            Self::DescribePortfolio => "DescribePortfolio",
            Self::CreatePortfolio => "CreatePortfolio",
            Self::AssociatePrincipal => "AssociatePrincipalWithPortfolio",
            Self::SearchProductsAsAdmin => "SearchProductsAsAdmin",
            Self::CopyProduct => "CopyProduct",
            Self::AssociateProduct => "AssociateProductWithPortfolio",
            Self::ListConstraints => "ListConstraintsForPortfolio",
            Self::CreateConstraint => "CreateConstraint",
            Self::AcceptPortfolioShare => "AcceptPortfolioShare",
            Self::GetCallerIdentity => "GetCallerIdentity",
        }
    }

    /// True for calls that change remote state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::CreatePortfolio
                | Self::AssociatePrincipal
                | Self::CopyProduct
                | Self::AssociateProduct
                | Self::CreateConstraint
                | Self::AcceptPortfolioShare
        )
    }
}

impl fmt::Display for CatalogOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action())
    }
}

/// A remote call failed.
///
/// Throttling, permission and validation failures all map to this one kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed: {message}")]
pub struct CatalogError {
    pub operation: CatalogOperation,
    pub message: String,
}

impl CatalogError {
    pub fn new(operation: CatalogOperation, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }

    /// The call succeeded but the response lacked a required field.
    pub fn incomplete_response(operation: CatalogOperation, field: &str) -> Self {
        Self::new(operation, format!("response is missing {field}"))
    }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Catalog-management operations used by the reconcilers.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Portfolios shared with this account under `share_type`.
    async fn list_accepted_portfolio_shares(
        &self,
        share_type: ShareType,
    ) -> CatalogResult<Vec<Portfolio>>;

    /// Portfolios owned by this account.
    async fn list_portfolios(&self) -> CatalogResult<Vec<Portfolio>>;

    async fn describe_portfolio(&self, id: &PortfolioId) -> CatalogResult<Portfolio>;

    async fn create_portfolio(
        &self,
        portfolio: &NewPortfolio,
        accept_language: &str,
    ) -> CatalogResult<Portfolio>;

    /// Grant an IAM principal access to a portfolio.
    async fn associate_principal(
        &self,
        portfolio_id: &PortfolioId,
        principal_arn: &str,
    ) -> CatalogResult<()>;

    /// Admin product search; `None` searches the whole account.
    async fn search_products(
        &self,
        portfolio_id: Option<&PortfolioId>,
    ) -> CatalogResult<Vec<Product>>;

    /// Start copying a product into this account. Returns the copy token.
    async fn copy_product(
        &self,
        source_arn: &str,
        accept_language: &str,
    ) -> CatalogResult<String>;

    async fn associate_product(
        &self,
        product_id: &ProductId,
        portfolio_id: &PortfolioId,
        accept_language: &str,
    ) -> CatalogResult<()>;

    async fn list_constraints(
        &self,
        portfolio_id: &PortfolioId,
        product_id: &ProductId,
    ) -> CatalogResult<Vec<ConstraintSummary>>;

    /// Returns the new constraint id.
    async fn create_constraint(&self, constraint: &NewConstraint) -> CatalogResult<String>;

    async fn accept_portfolio_share(&self, portfolio_id: &PortfolioId) -> CatalogResult<()>;
}

/// Resolves the account the importer runs in.
#[async_trait]
pub trait IdentityClient: Send + Sync {
    async fn current_account(&self) -> CatalogResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_action() {
        let err = CatalogError::new(CatalogOperation::CopyProduct, "AccessDenied");
        assert_eq!(err.to_string(), "CopyProduct failed: AccessDenied");
    }

    #[test]
    fn test_incomplete_response() {
        let err = CatalogError::incomplete_response(
            CatalogOperation::CreatePortfolio,
            "PortfolioDetail.Id",
        );
        assert!(err.message.contains("PortfolioDetail.Id"));
    }

    #[test]
    fn test_mutation_classification() {
        assert!(CatalogOperation::CopyProduct.is_mutation());
        assert!(CatalogOperation::AcceptPortfolioShare.is_mutation());
        assert!(!CatalogOperation::SearchProductsAsAdmin.is_mutation());
        assert!(!CatalogOperation::GetCallerIdentity.is_mutation());
    }
}
