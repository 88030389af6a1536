//! Per-invocation record of what the importer did.

use crate::errors::ImportError;
use crate::types::ShareType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCounters {
    pub shares_accepted: u32,
    pub portfolios_created: u32,
    pub portfolios_reused: u32,
    pub principals_associated: u32,
    pub products_copied: u32,
    pub products_reused: u32,
    pub products_associated: u32,
    pub constraints_created: u32,
    pub constraints_skipped: u32,
}

/// Where a recorded failure happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureScope {
    Portfolio { portfolio: String },
    Product { portfolio: String, product: String },
}

impl fmt::Display for FailureScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Portfolio { portfolio } => write!(f, "portfolio '{portfolio}'"),
            Self::Product { portfolio, product } => {
                write!(f, "product '{product}' in portfolio '{portfolio}'")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFailure {
    pub scope: FailureScope,
    /// Error code, e.g. `SCIMP-E200`.
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub invocation_id: Uuid,
    pub share_type: ShareType,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub dry_run: bool,
    pub counters: ImportCounters,
    #[serde(default)]
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn new(share_type: ShareType) -> Self {
        Self {
            invocation_id: Uuid::new_v4(),
            share_type,
            started_at: Utc::now(),
            finished_at: None,
            dry_run: false,
            counters: ImportCounters::default(),
            failures: Vec::new(),
        }
    }

    pub fn record_failure(&mut self, scope: FailureScope, error: &ImportError) {
        let code = error.code();
        warn!(
            code = %code.code_string(),
            scope = %scope,
            error = %error,
            "Recorded failure; continuing with the next item"
        );
        self.failures.push(ImportFailure {
            scope,
            code: code.code_string(),
            message: error.to_string(),
        });
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fail with [`ImportError::Incomplete`] if any failure was recorded.
    pub fn into_result(self) -> Result<Self, ImportError> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(ImportError::Incomplete {
                failed: self.failures.len(),
            })
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    /// One structured summary line for the end of a run.
    pub fn log_summary(&self) {
        let c = &self.counters;
        info!(
            invocation_id = %self.invocation_id,
            share_type = %self.share_type,
            dry_run = self.dry_run,
            shares_accepted = c.shares_accepted,
            portfolios_created = c.portfolios_created,
            portfolios_reused = c.portfolios_reused,
            principals_associated = c.principals_associated,
            products_copied = c.products_copied,
            products_reused = c.products_reused,
            products_associated = c.products_associated,
            constraints_created = c.constraints_created,
            constraints_skipped = c.constraints_skipped,
            failures = self.failures.len(),
            duration_ms = self.duration_ms().unwrap_or_default(),
            "Import finished"
        );
    }
}
