//! Lambda invocation handler.

use crate::aws::{AwsCatalog, AwsIdentity};
use aws_config::SdkConfig;
use lambda_runtime::LambdaEvent;
use scimp_common::catalog::{CatalogClient, IdentityClient};
use scimp_common::{ImportError, ImporterConfig, run_import};
use serde_json::Value;
use tracing::{Instrument, info, info_span};

/// Response body of a successful invocation.
pub const SUCCESS: &str = "Success";

pub struct Handler {
    sdk_config: SdkConfig,
}

impl Handler {
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }

    pub async fn invoke(&self, event: LambdaEvent<Value>) -> Result<Value, lambda_runtime::Error> {
        let (payload, context) = event.into_parts();
        let span = info_span!("invocation", request_id = %context.request_id);

        async move {
            // Configuration errors fail the invocation, not the runtime init.
            let config = ImporterConfig::from_env().map_err(|err| {
                let err = ImportError::from(err);
                err.log();
                err
            })?;
            let timeout = config.operation_timeout();
            let catalog = AwsCatalog::new(&self.sdk_config, timeout);
            let identity = AwsIdentity::new(&self.sdk_config, timeout);

            Ok::<_, lambda_runtime::Error>(
                handle_payload(&catalog, &identity, &config, &payload).await?,
            )
        }
        .instrument(span)
        .await
    }
}

/// Run one import and build the Lambda response.
pub async fn handle_payload(
    catalog: &dyn CatalogClient,
    identity: &dyn IdentityClient,
    config: &ImporterConfig,
    payload: &Value,
) -> Result<Value, ImportError> {
    let report = run_import(catalog, identity, config, payload).await?;
    info!(invocation_id = %report.invocation_id, "Invocation succeeded");
    Ok(Value::String(SUCCESS.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scimp_common::mock::{MockCatalog, MockIdentity};
    use scimp_common::{ErrorCode, Portfolio, PortfolioId, ShareType};
    use serde_json::json;

    fn organization_event() -> Value {
        json!({
            "Records": [{
                "Sns": {
                    "Message": json!({
                        "detail": { "eventName": "UpdatePortfolio" }
                    }).to_string()
                }
            }]
        })
    }

    #[tokio::test]
    async fn test_success_response() {
        let catalog = MockCatalog::builder()
            .shared_portfolio(
                ShareType::AwsOrganizations,
                Portfolio {
                    id: PortfolioId::new("port-hub-1"),
                    display_name: "Net-Ops".to_string(),
                    description: String::new(),
                    provider_name: "CentralIT".to_string(),
                },
                vec![],
            )
            .build();
        let config = ImporterConfig::new("SCEndUser", "SCLaunchRole");

        let response = handle_payload(
            &catalog,
            &MockIdentity::new("111122223333"),
            &config,
            &organization_event(),
        )
        .await
        .unwrap();

        assert_eq!(response, Value::String("Success".to_string()));
    }

    #[tokio::test]
    async fn test_failure_is_an_error() {
        let catalog = MockCatalog::builder().build();
        let config = ImporterConfig::new("SCEndUser", "SCLaunchRole");

        let err = handle_payload(
            &catalog,
            &MockIdentity::new("111122223333"),
            &config,
            &json!({"unexpected": true}),
        )
        .await
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::EventMalformed);
    }
}
