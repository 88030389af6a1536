//! Core of the Service Catalog portfolio importer.
//!
//! The importer reacts to a portfolio-sharing notification and mirrors every
//! shared portfolio into the local account: a local portfolio per shared one,
//! end-user access for a configured IAM role, copies of the shared products
//! and a launch constraint per (product, portfolio) pair.

pub mod catalog;
pub mod config;
pub mod dry_run;
pub mod entrypoint;
pub mod errors;
pub mod event;
pub mod logging;
pub mod mock;
pub mod poll;
pub mod reconcile;
pub mod report;
pub mod resolver;
pub mod types;

pub use catalog::{CatalogClient, CatalogError, CatalogOperation, CatalogResult, IdentityClient};
pub use config::{ConfigError, FailureMode, ImporterConfig};
pub use dry_run::{DryRunCatalog, PlannedAction};
pub use entrypoint::{Invocation, run_import};
pub use errors::{ErrorCategory, ErrorCode, ErrorEntry, ImportError};
pub use event::{CatalogEvent, EventError, ShareDecision, classify_share, parse_notification};
pub use logging::{LogConfig, LogFormat, LoggingGuards, init_logging};
pub use poll::{PollOutcome, PollPolicy};
pub use reconcile::{ReconcileOptions, Reconciler};
pub use report::{FailureScope, ImportCounters, ImportFailure, ImportReport};
pub use resolver::NameIndex;
pub use types::{
    ConstraintSummary, ImportTargets, NewConstraint, NewPortfolio, Portfolio, PortfolioId, Product,
    ProductId, ShareType,
};
