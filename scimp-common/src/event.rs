//! Triggering notification: an SNS envelope wrapping a catalog API event.
//!
//! ```text
//! {"Records":[{"Sns":{"Message":"{\"detail\":{\"eventName\":...,\"requestParameters\":{...}}}"}}]}
//! ```

use crate::types::{PortfolioId, ShareType};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Event that announces a direct, account-level portfolio share.
pub const CREATE_PORTFOLIO_SHARE: &str = "CreatePortfolioShare";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("notification is not a valid SNS envelope: {0}")]
    InvalidEnvelope(String),

    #[error("notification envelope has no records")]
    NoRecords,

    #[error("SNS message is not a catalog event: {0}")]
    InvalidMessage(String),

    #[error("CreatePortfolioShare event for this account has no requestParameters.portfolioId")]
    MissingPortfolioId,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "Records", default)]
    records: Vec<EnvelopeRecord>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeRecord {
    #[serde(rename = "Sns")]
    sns: SnsPayload,
}

#[derive(Debug, Deserialize)]
struct SnsPayload {
    #[serde(rename = "Message")]
    message: String,
}

#[derive(Debug, Deserialize)]
struct EventMessage {
    detail: CatalogEvent,
}

/// The catalog API call that triggered this invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEvent {
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "requestParameters", default)]
    pub request_parameters: Option<RequestParameters>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestParameters {
    #[serde(rename = "portfolioId", default)]
    pub portfolio_id: Option<String>,
    #[serde(rename = "accountId", default)]
    pub account_id: Option<String>,
}

impl CatalogEvent {
    pub fn portfolio_id(&self) -> Option<&str> {
        self.request_parameters
            .as_ref()
            .and_then(|p| p.portfolio_id.as_deref())
    }

    pub fn account_id(&self) -> Option<&str> {
        self.request_parameters
            .as_ref()
            .and_then(|p| p.account_id.as_deref())
    }
}

/// Unwrap the first record of an SNS envelope into the catalog event.
pub fn parse_notification(payload: &serde_json::Value) -> Result<CatalogEvent, EventError> {
    let envelope =
        Envelope::deserialize(payload).map_err(|e| EventError::InvalidEnvelope(e.to_string()))?;
    let record = envelope.records.into_iter().next().ok_or(EventError::NoRecords)?;

    let message: EventMessage = serde_json::from_str(&record.sns.message)
        .map_err(|e| EventError::InvalidMessage(e.to_string()))?;
    debug!(event = ?message.detail, "Parsed catalog event");
    Ok(message.detail)
}

/// How the shared portfolios of this invocation must be discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareDecision {
    /// Organization share; nothing to accept.
    Organization,
    /// Direct share with this account; `portfolio_id` must be accepted first.
    DirectShare { portfolio_id: PortfolioId },
}

impl ShareDecision {
    pub fn share_type(&self) -> ShareType {
        match self {
            Self::Organization => ShareType::AwsOrganizations,
            Self::DirectShare { .. } => ShareType::Imported,
        }
    }
}

/// A `CreatePortfolioShare` naming the current account is a direct share;
/// everything else is treated as an organization share.
pub fn classify_share(
    event: &CatalogEvent,
    current_account: &str,
) -> Result<ShareDecision, EventError> {
    let targets_this_account = event.account_id() == Some(current_account);
    if event.event_name != CREATE_PORTFOLIO_SHARE || !targets_this_account {
        debug!(
            event_name = %event.event_name,
            target_account = event.account_id().unwrap_or("-"),
            "Treating notification as organization share"
        );
        return Ok(ShareDecision::Organization);
    }

    let portfolio_id = event
        .portfolio_id()
        .filter(|id| !id.is_empty())
        .ok_or(EventError::MissingPortfolioId)?;
    info!(
        account = current_account,
        portfolio_id, "Portfolio shared directly with this account"
    );
    Ok(ShareDecision::DirectShare {
        portfolio_id: PortfolioId::new(portfolio_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(detail: serde_json::Value) -> serde_json::Value {
        json!({
            "Records": [{
                "EventSource": "aws:sns",
                "Sns": {
                    "Type": "Notification",
                    "Message": json!({ "detail": detail }).to_string(),
                }
            }]
        })
    }

    #[test]
    fn test_parse_direct_share_event() {
        let payload = envelope(json!({
            "eventName": "CreatePortfolioShare",
            "requestParameters": {"portfolioId": "port-abc", "accountId": "111122223333"}
        }));

        let event = parse_notification(&payload).unwrap();
        assert_eq!(event.event_name, "CreatePortfolioShare");
        assert_eq!(event.portfolio_id(), Some("port-abc"));
        assert_eq!(event.account_id(), Some("111122223333"));
    }

    #[test]
    fn test_parse_tolerates_missing_or_null_parameters() {
        let event = parse_notification(&envelope(json!({"eventName": "UpdatePortfolio"}))).unwrap();
        assert!(event.request_parameters.is_none());

        let event = parse_notification(&envelope(json!({
            "eventName": "UpdatePortfolio",
            "requestParameters": null
        })))
        .unwrap();
        assert_eq!(event.account_id(), None);
    }

    #[test]
    fn test_parse_rejects_empty_records() {
        assert_eq!(
            parse_notification(&json!({"Records": []})),
            Err(EventError::NoRecords)
        );
        assert_eq!(parse_notification(&json!({})), Err(EventError::NoRecords));
    }

    #[test]
    fn test_parse_rejects_non_json_message() {
        let payload = json!({"Records": [{"Sns": {"Message": "not json"}}]});
        assert!(matches!(
            parse_notification(&payload),
            Err(EventError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_classify_direct_share_for_current_account() {
        let event = CatalogEvent {
            event_name: CREATE_PORTFOLIO_SHARE.to_string(),
            request_parameters: Some(RequestParameters {
                portfolio_id: Some("port-abc".to_string()),
                account_id: Some("111122223333".to_string()),
            }),
        };

        let decision = classify_share(&event, "111122223333").unwrap();
        assert_eq!(
            decision,
            ShareDecision::DirectShare {
                portfolio_id: PortfolioId::new("port-abc")
            }
        );
        assert_eq!(decision.share_type(), ShareType::Imported);
    }

    #[test]
    fn test_classify_share_for_other_account_is_organization() {
        let event = CatalogEvent {
            event_name: CREATE_PORTFOLIO_SHARE.to_string(),
            request_parameters: Some(RequestParameters {
                portfolio_id: Some("port-abc".to_string()),
                account_id: Some("999999999999".to_string()),
            }),
        };

        let decision = classify_share(&event, "111122223333").unwrap();
        assert_eq!(decision, ShareDecision::Organization);
        assert_eq!(decision.share_type(), ShareType::AwsOrganizations);
    }

    #[test]
    fn test_classify_other_event_is_organization() {
        let event = CatalogEvent {
            event_name: "AssociateProductWithPortfolio".to_string(),
            request_parameters: Some(RequestParameters {
                portfolio_id: None,
                account_id: Some("111122223333".to_string()),
            }),
        };
        assert_eq!(
            classify_share(&event, "111122223333").unwrap(),
            ShareDecision::Organization
        );
    }

    #[test]
    fn test_classify_direct_share_without_portfolio_fails() {
        let event = CatalogEvent {
            event_name: CREATE_PORTFOLIO_SHARE.to_string(),
            request_parameters: Some(RequestParameters {
                portfolio_id: None,
                account_id: Some("111122223333".to_string()),
            }),
        };
        assert_eq!(
            classify_share(&event, "111122223333"),
            Err(EventError::MissingPortfolioId)
        );
    }
}
