//! AWS SDK implementations of the catalog and identity facades.
//!
//! Each call returns a single page; list and search results are not paginated.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_servicecatalog::Client;
use aws_sdk_servicecatalog::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_servicecatalog::types::{
    CopyOption, PortfolioDetail, PortfolioShareType, PrincipalType, ProductViewDetail, Tag,
};
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::timeout::TimeoutConfig;
use scimp_common::catalog::{
    CatalogClient, CatalogError, CatalogOperation, CatalogResult, IdentityClient,
};
use scimp_common::types::{
    ConstraintSummary, NewConstraint, NewPortfolio, Portfolio, PortfolioId, Product, ProductId,
    ShareType,
};
use std::time::Duration;
use tracing::debug;

/// Shared SDK configuration from the standard credential and region chain.
pub async fn load_sdk_config() -> SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}

fn timeout_config(timeout: Duration) -> TimeoutConfig {
    TimeoutConfig::builder().operation_timeout(timeout).build()
}

/// Map an SDK failure to the single remote error kind.
fn remote_error<E>(operation: CatalogOperation, err: SdkError<E>) -> CatalogError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let message = match &err {
        SdkError::ServiceError(service_err) => {
            let inner = service_err.err();
            format!(
                "{}: {} (HTTP {})",
                inner.code().unwrap_or("ServiceError"),
                inner.message().unwrap_or("no message"),
                service_err.raw().status().as_u16()
            )
        }
        SdkError::TimeoutError(_) => "request timed out".to_string(),
        SdkError::DispatchFailure(_) => {
            format!("connection error: {}", DisplayErrorContext(&err))
        }
        _ => DisplayErrorContext(&err).to_string(),
    };
    debug!(%operation, error = %message, "Remote call failed");
    CatalogError::new(operation, message)
}

fn share_type(share_type: ShareType) -> PortfolioShareType {
    match share_type {
        ShareType::AwsOrganizations => PortfolioShareType::AwsOrganizations,
        ShareType::Imported => PortfolioShareType::Imported,
    }
}

fn portfolio_from(operation: CatalogOperation, detail: &PortfolioDetail) -> CatalogResult<Portfolio> {
    let id = detail
        .id()
        .ok_or_else(|| CatalogError::incomplete_response(operation, "PortfolioDetail.Id"))?;
    Ok(Portfolio {
        id: PortfolioId::new(id),
        display_name: detail.display_name().unwrap_or_default().to_string(),
        description: detail.description().unwrap_or_default().to_string(),
        provider_name: detail.provider_name().unwrap_or_default().to_string(),
    })
}

fn product_from(detail: &ProductViewDetail) -> CatalogResult<Product> {
    let operation = CatalogOperation::SearchProductsAsAdmin;
    let summary = detail
        .product_view_summary()
        .ok_or_else(|| CatalogError::incomplete_response(operation, "ProductViewSummary"))?;
    let product_id = summary
        .product_id()
        .ok_or_else(|| CatalogError::incomplete_response(operation, "ProductViewSummary.ProductId"))?;
    Ok(Product {
        product_id: ProductId::new(product_id),
        name: summary.name().unwrap_or_default().to_string(),
        arn: detail.product_arn().unwrap_or_default().to_string(),
    })
}

pub struct AwsCatalog {
    client: Client,
}

impl AwsCatalog {
    pub fn new(sdk_config: &SdkConfig, timeout: Option<Duration>) -> Self {
        let mut builder = aws_sdk_servicecatalog::config::Builder::from(sdk_config);
        if let Some(timeout) = timeout {
            builder = builder.timeout_config(timeout_config(timeout));
        }
        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl CatalogClient for AwsCatalog {
    async fn list_accepted_portfolio_shares(
        &self,
        kind: ShareType,
    ) -> CatalogResult<Vec<Portfolio>> {
        let operation = CatalogOperation::ListAcceptedPortfolioShares;
        let output = self
            .client
            .list_accepted_portfolio_shares()
            .portfolio_share_type(share_type(kind))
            .send()
            .await
            .map_err(|e| remote_error(operation, e))?;
        output
            .portfolio_details()
            .iter()
            .map(|detail| portfolio_from(operation, detail))
            .collect()
    }

    async fn list_portfolios(&self) -> CatalogResult<Vec<Portfolio>> {
        let operation = CatalogOperation::ListPortfolios;
        let output = self
            .client
            .list_portfolios()
            .send()
            .await
            .map_err(|e| remote_error(operation, e))?;
        output
            .portfolio_details()
            .iter()
            .map(|detail| portfolio_from(operation, detail))
            .collect()
    }

    async fn describe_portfolio(&self, id: &PortfolioId) -> CatalogResult<Portfolio> {
        let operation = CatalogOperation::DescribePortfolio;
        let output = self
            .client
            .describe_portfolio()
            .id(id.as_str())
            .send()
            .await
            .map_err(|e| remote_error(operation, e))?;
        let detail = output
            .portfolio_detail()
            .ok_or_else(|| CatalogError::incomplete_response(operation, "PortfolioDetail"))?;
        portfolio_from(operation, detail)
    }

    async fn create_portfolio(
        &self,
        portfolio: &NewPortfolio,
        accept_language: &str,
    ) -> CatalogResult<Portfolio> {
        let operation = CatalogOperation::CreatePortfolio;
        let mut request = self
            .client
            .create_portfolio()
            .display_name(&portfolio.display_name)
            .provider_name(&portfolio.provider_name)
            .accept_language(accept_language);
        if !portfolio.description.is_empty() {
            request = request.description(&portfolio.description);
        }
        for (key, value) in &portfolio.tags {
            let tag = Tag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(|e| CatalogError::new(operation, format!("invalid tag {key}: {e}")))?;
            request = request.tags(tag);
        }

        let output = request
            .send()
            .await
            .map_err(|e| remote_error(operation, e))?;
        let detail = output
            .portfolio_detail()
            .ok_or_else(|| CatalogError::incomplete_response(operation, "PortfolioDetail"))?;
        portfolio_from(operation, detail)
    }

    async fn associate_principal(
        &self,
        portfolio_id: &PortfolioId,
        principal_arn: &str,
    ) -> CatalogResult<()> {
        self.client
            .associate_principal_with_portfolio()
            .portfolio_id(portfolio_id.as_str())
            .principal_arn(principal_arn)
            .principal_type(PrincipalType::Iam)
            .send()
            .await
            .map_err(|e| remote_error(CatalogOperation::AssociatePrincipal, e))?;
        Ok(())
    }

    async fn search_products(
        &self,
        portfolio_id: Option<&PortfolioId>,
    ) -> CatalogResult<Vec<Product>> {
        let output = self
            .client
            .search_products_as_admin()
            .set_portfolio_id(portfolio_id.map(|id| id.as_str().to_string()))
            .send()
            .await
            .map_err(|e| remote_error(CatalogOperation::SearchProductsAsAdmin, e))?;
        output.product_view_details().iter().map(product_from).collect()
    }

    async fn copy_product(&self, source_arn: &str, accept_language: &str) -> CatalogResult<String> {
        let operation = CatalogOperation::CopyProduct;
        let output = self
            .client
            .copy_product()
            .source_product_arn(source_arn)
            .copy_options(CopyOption::CopyTags)
            .accept_language(accept_language)
            .send()
            .await
            .map_err(|e| remote_error(operation, e))?;
        output
            .copy_product_token()
            .map(str::to_string)
            .ok_or_else(|| CatalogError::incomplete_response(operation, "CopyProductToken"))
    }

    async fn associate_product(
        &self,
        product_id: &ProductId,
        portfolio_id: &PortfolioId,
        accept_language: &str,
    ) -> CatalogResult<()> {
        self.client
            .associate_product_with_portfolio()
            .product_id(product_id.as_str())
            .portfolio_id(portfolio_id.as_str())
            .accept_language(accept_language)
            .send()
            .await
            .map_err(|e| remote_error(CatalogOperation::AssociateProduct, e))?;
        Ok(())
    }

    async fn list_constraints(
        &self,
        portfolio_id: &PortfolioId,
        product_id: &ProductId,
    ) -> CatalogResult<Vec<ConstraintSummary>> {
        let output = self
            .client
            .list_constraints_for_portfolio()
            .portfolio_id(portfolio_id.as_str())
            .product_id(product_id.as_str())
            .send()
            .await
            .map_err(|e| remote_error(CatalogOperation::ListConstraints, e))?;
        Ok(output
            .constraint_details()
            .iter()
            .map(|detail| ConstraintSummary {
                constraint_id: detail.constraint_id().unwrap_or_default().to_string(),
                kind: detail.r#type().unwrap_or_default().to_string(),
            })
            .collect())
    }

    async fn create_constraint(&self, constraint: &NewConstraint) -> CatalogResult<String> {
        let operation = CatalogOperation::CreateConstraint;
        let output = self
            .client
            .create_constraint()
            .portfolio_id(constraint.portfolio_id.as_str())
            .product_id(constraint.product_id.as_str())
            .r#type(&constraint.kind)
            .parameters(&constraint.parameters)
            .description(&constraint.description)
            .send()
            .await
            .map_err(|e| remote_error(operation, e))?;
        output
            .constraint_detail()
            .and_then(|detail| detail.constraint_id())
            .map(str::to_string)
            .ok_or_else(|| CatalogError::incomplete_response(operation, "ConstraintDetail.ConstraintId"))
    }

    async fn accept_portfolio_share(&self, portfolio_id: &PortfolioId) -> CatalogResult<()> {
        self.client
            .accept_portfolio_share()
            .portfolio_id(portfolio_id.as_str())
            .portfolio_share_type(PortfolioShareType::Imported)
            .send()
            .await
            .map_err(|e| remote_error(CatalogOperation::AcceptPortfolioShare, e))?;
        Ok(())
    }
}

pub struct AwsIdentity {
    client: aws_sdk_sts::Client,
}

impl AwsIdentity {
    pub fn new(sdk_config: &SdkConfig, timeout: Option<Duration>) -> Self {
        let mut builder = aws_sdk_sts::config::Builder::from(sdk_config);
        if let Some(timeout) = timeout {
            builder = builder.timeout_config(timeout_config(timeout));
        }
        Self {
            client: aws_sdk_sts::Client::from_conf(builder.build()),
        }
    }
}

#[async_trait]
impl IdentityClient for AwsIdentity {
    async fn current_account(&self) -> CatalogResult<String> {
        let operation = CatalogOperation::GetCallerIdentity;
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| remote_error(operation, e))?;
        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| CatalogError::incomplete_response(operation, "Account"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_type_mapping() {
        assert_eq!(
            share_type(ShareType::AwsOrganizations),
            PortfolioShareType::AwsOrganizations
        );
        assert_eq!(share_type(ShareType::Imported), PortfolioShareType::Imported);
        assert_eq!(
            share_type(ShareType::AwsOrganizations).as_str(),
            ShareType::AwsOrganizations.as_api_str()
        );
    }

    #[test]
    fn test_portfolio_from_defaults_missing_fields() {
        let detail = PortfolioDetail::builder()
            .id("port-abc")
            .display_name("Net-Ops")
            .build();
        let portfolio = portfolio_from(CatalogOperation::ListPortfolios, &detail).unwrap();
        assert_eq!(portfolio.id, PortfolioId::new("port-abc"));
        assert_eq!(portfolio.description, "");
        assert_eq!(portfolio.provider_name, "");
    }

    #[test]
    fn test_portfolio_without_id_is_incomplete() {
        let detail = PortfolioDetail::builder().display_name("Net-Ops").build();
        let err = portfolio_from(CatalogOperation::DescribePortfolio, &detail).unwrap_err();
        assert_eq!(err.operation, CatalogOperation::DescribePortfolio);
        assert!(err.message.contains("PortfolioDetail.Id"));
    }

    #[test]
    fn test_product_from_view_detail() {
        use aws_sdk_servicecatalog::types::ProductViewSummary;

        let detail = ProductViewDetail::builder()
            .product_view_summary(
                ProductViewSummary::builder()
                    .product_id("prod-123")
                    .name("VPC-Baseline")
                    .build(),
            )
            .product_arn("arn:aws:catalog:us-east-1:111122223333:product/prod-123")
            .build();
        let product = product_from(&detail).unwrap();
        assert_eq!(product.product_id, ProductId::new("prod-123"));
        assert_eq!(product.name, "VPC-Baseline");
    }
}
