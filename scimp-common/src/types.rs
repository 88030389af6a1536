//! Catalog entities mirrored in memory for the duration of one invocation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Constraint type created by the importer.
pub const LAUNCH_CONSTRAINT_TYPE: &str = "LAUNCH";

/// Tag written on every portfolio the importer creates.
pub const INHERITED_TAG_KEY: &str = "PortfolioType";
pub const INHERITED_TAG_VALUE: &str = "Inherited";

/// Portfolio identifier (e.g. `port-abc123`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortfolioId(pub String);

impl PortfolioId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortfolioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Product identifier (e.g. `prod-abc123`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A portfolio, either shared with the account or local to it.
///
/// Optional remote fields are normalized to empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portfolio {
    pub id: PortfolioId,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub provider_name: String,
}

/// Attributes of a portfolio to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPortfolio {
    pub display_name: String,
    pub description: String,
    pub provider_name: String,
    pub tags: Vec<(String, String)>,
}

impl NewPortfolio {
    /// Local mirror of a shared portfolio, tagged as inherited.
    pub fn mirror_of(shared: &Portfolio) -> Self {
        Self {
            display_name: shared.display_name.clone(),
            description: shared.description.clone(),
            provider_name: shared.provider_name.clone(),
            tags: vec![(
                INHERITED_TAG_KEY.to_string(),
                INHERITED_TAG_VALUE.to_string(),
            )],
        }
    }
}

/// A product as seen by an admin product search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub arn: String,
}

/// A constraint attached to a (portfolio, product) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSummary {
    pub constraint_id: String,
    /// Constraint type, e.g. `LAUNCH`, `NOTIFICATION`.
    pub kind: String,
}

impl ConstraintSummary {
    pub fn is_launch(&self) -> bool {
        self.kind == LAUNCH_CONSTRAINT_TYPE
    }
}

/// A launch constraint to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConstraint {
    pub portfolio_id: PortfolioId,
    pub product_id: ProductId,
    pub kind: String,
    /// JSON parameters, e.g. `{"RoleArn":"arn:aws:iam::123456789012:role/Launch"}`.
    pub parameters: String,
    pub description: String,
}

impl NewConstraint {
    pub fn launch(portfolio_id: &PortfolioId, product_id: &ProductId, parameters: &str) -> Self {
        Self {
            portfolio_id: portfolio_id.clone(),
            product_id: product_id.clone(),
            kind: LAUNCH_CONSTRAINT_TYPE.to_string(),
            parameters: parameters.to_string(),
            description: format!("Launch constraint for product ID {product_id}"),
        }
    }
}

/// How a portfolio reached this account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShareType {
    /// Shared to the whole organization or an OU; no acceptance needed.
    AwsOrganizations,
    /// Shared directly with this account; must be accepted.
    Imported,
}

impl ShareType {
    /// Wire value expected by the catalog API.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::AwsOrganizations => "AWS_ORGANIZATIONS",
            Self::Imported => "IMPORTED",
        }
    }
}

impl Default for ShareType {
    fn default() -> Self {
        Self::AwsOrganizations
    }
}

impl fmt::Display for ShareType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// Identity granted access to every mirrored portfolio, and the launch
/// parameters attached to every mirrored product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportTargets {
    pub account_id: String,
    pub principal_arn: String,
    pub launch_parameters: String,
}

impl ImportTargets {
    /// Derive ARNs for `account_id` from already-validated role names.
    pub fn for_account(
        partition: &str,
        account_id: &str,
        principal_role_name: &str,
        launch_role_name: &str,
    ) -> Self {
        let principal_arn = role_arn(partition, account_id, principal_role_name);
        let launch_parameters = serde_json::json!({
            "RoleArn": role_arn(partition, account_id, launch_role_name),
        })
        .to_string();

        Self {
            account_id: account_id.to_string(),
            principal_arn,
            launch_parameters,
        }
    }
}

/// `arn:<partition>:iam::<account>:role/<name>`
pub fn role_arn(partition: &str, account_id: &str, role_name: &str) -> String {
    format!("arn:{partition}:iam::{account_id}:role/{role_name}")
}
