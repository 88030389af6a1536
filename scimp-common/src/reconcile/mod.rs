//! Reconciliation of shared portfolios into local mirrors.
//!
//! ```text
//! portfolios ──► identity
//!            └─► products ──► constraint
//! ```
//!
//! Every step is sequential; one remote call is in flight at a time.

mod constraint;
mod identity;
mod portfolio;
mod product;

use crate::catalog::CatalogClient;
use crate::config::{FailureMode, ImporterConfig};
use crate::errors::Result;
use crate::poll::PollPolicy;
use crate::report::{FailureScope, ImportReport};
use crate::types::{ImportTargets, ShareType};

/// Per-invocation settings shared by all reconcilers.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub accept_language: String,
    pub poll: PollPolicy,
    pub failure_mode: FailureMode,
    pub targets: ImportTargets,
}

impl ReconcileOptions {
    pub fn from_config(config: &ImporterConfig, targets: ImportTargets) -> Self {
        Self {
            accept_language: config.accept_language.value.clone(),
            poll: config.poll_policy(),
            failure_mode: config.failure_mode(),
            targets,
        }
    }
}

pub struct Reconciler<'a> {
    catalog: &'a dyn CatalogClient,
    options: &'a ReconcileOptions,
}

impl<'a> Reconciler<'a> {
    pub fn new(catalog: &'a dyn CatalogClient, options: &'a ReconcileOptions) -> Self {
        Self { catalog, options }
    }

    /// Mirror every portfolio shared with this account under `share_type`.
    pub async fn run(&self, share_type: ShareType, report: &mut ImportReport) -> Result<()> {
        self.reconcile_portfolios(share_type, report).await
    }

    /// Apply the failure mode to the outcome of one portfolio or product.
    fn settle(
        &self,
        outcome: Result<()>,
        scope: FailureScope,
        report: &mut ImportReport,
    ) -> Result<()> {
        match (outcome, self.options.failure_mode) {
            (Ok(()), _) => Ok(()),
            (Err(err), FailureMode::ContinueOnError) => {
                report.record_failure(scope, &err);
                Ok(())
            }
            (Err(err), FailureMode::FailFast) => Err(err),
        }
    }
}
