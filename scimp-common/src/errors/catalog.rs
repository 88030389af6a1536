//! Error catalog for the Service Catalog importer.
//!
//! Each failure the importer can report maps to a stable code
//! (SCIMP-E001 ...), a message, and remediation steps that are logged next
//! to the error so operators can act on a failed invocation from its logs.
//!
//! # Error Code Ranges
//!
//! | Range      | Category | Description                               |
//! |------------|----------|-------------------------------------------|
//! | E001-E099  | Config   | Function configuration                    |
//! | E100-E199  | Event    | Triggering notification                   |
//! | E200-E299  | Remote   | Catalog and identity service calls        |
//! | E300-E399  | Import   | Outcome of the reconciliation as a whole  |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code enumeration covering all importer failure scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    // =========================================================================
    // Config Errors (E001-E099)
    // =========================================================================
    /// A required role name variable is unset
    ConfigMissingRole,
    /// A tunable has an invalid value
    ConfigInvalidValue,

    // =========================================================================
    // Event Errors (E100-E199)
    // =========================================================================
    /// Notification is not an SNS-wrapped catalog event
    EventMalformed,
    /// Direct share event without a portfolio id
    EventMissingPortfolio,
    /// Saved notification file could not be read
    EventFileUnreadable,

    // =========================================================================
    // Remote Errors (E200-E299)
    // =========================================================================
    /// A catalog or identity service call failed
    RemoteCallFailed,
    /// A copied product never became visible
    RemoteCopyNotVisible,

    // =========================================================================
    // Import Errors (E300-E399)
    // =========================================================================
    /// Continue-on-error run finished with recorded failures
    ImportIncomplete,
}

impl ErrorCode {
    /// All codes, in numeric order.
    pub fn all() -> &'static [ErrorCode] {
        &[
            Self::ConfigMissingRole,
            Self::ConfigInvalidValue,
            Self::EventMalformed,
            Self::EventMissingPortfolio,
            Self::EventFileUnreadable,
            Self::RemoteCallFailed,
            Self::RemoteCopyNotVisible,
            Self::ImportIncomplete,
        ]
    }

    /// Returns the numeric part of the code.
    #[must_use]
    pub const fn code_number(&self) -> u16 {
        match self {
            Self::ConfigMissingRole => 1,
            Self::ConfigInvalidValue => 2,

            Self::EventMalformed => 100,
            Self::EventMissingPortfolio => 101,
            Self::EventFileUnreadable => 102,

            Self::RemoteCallFailed => 200,
            Self::RemoteCopyNotVisible => 201,

            Self::ImportIncomplete => 300,
        }
    }

    /// Returns the formatted error code string (e.g., "SCIMP-E001").
    #[must_use]
    pub fn code_string(&self) -> String {
        format!("SCIMP-E{:03}", self.code_number())
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self.code_number() {
            1..=99 => ErrorCategory::Config,
            100..=199 => ErrorCategory::Event,
            200..=299 => ErrorCategory::Remote,
            _ => ErrorCategory::Import,
        }
    }

    /// Returns the full error entry with all metadata.
    #[must_use]
    pub fn entry(&self) -> ErrorEntry {
        ErrorEntry {
            code: self.code_string(),
            category: self.category(),
            message: self.message().to_string(),
            remediation: self
                .remediation()
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::ConfigMissingRole => "Required IAM role name is not configured",
            Self::ConfigInvalidValue => "Importer setting has an invalid value",
            Self::EventMalformed => "Notification is not an SNS-wrapped catalog event",
            Self::EventMissingPortfolio => "Direct portfolio share event does not name a portfolio",
            Self::EventFileUnreadable => "Notification file could not be read",
            Self::RemoteCallFailed => "Catalog service call failed",
            Self::RemoteCopyNotVisible => "Copied product did not become visible in time",
            Self::ImportIncomplete => "Import finished with failed portfolios or products",
        }
    }

    /// Returns remediation steps for this error.
    #[must_use]
    pub const fn remediation(&self) -> &'static [&'static str] {
        match self {
            Self::ConfigMissingRole => &[
                "Set default_iam_principal_role_name to the end-user role name (not ARN)",
                "Set default_launch_constraint to the launch role name (not ARN)",
                "Run 'scimp config' to see the resolved configuration",
            ],
            Self::ConfigInvalidValue => &[
                "Check SCIMP_* variables against 'scimp config' output",
                "Unset the variable to fall back to its default",
            ],
            Self::EventMalformed => &[
                "Subscribe the function to the SNS topic fed by the catalog event rule",
                "Check the rule delivers the full event, not an input transformer",
            ],
            Self::EventMissingPortfolio => &[
                "Verify the CreatePortfolioShare event carries requestParameters.portfolioId",
                "Accept the share manually, then re-run with an organization share event",
            ],
            Self::EventFileUnreadable => &[
                "Check the --event path exists and is readable",
            ],
            Self::RemoteCallFailed => &[
                "Check the function role allows the failed servicecatalog/sts action",
                "Check the portfolio or product still exists in the hub account",
                "Re-run the import; completed steps are skipped",
            ],
            Self::RemoteCopyNotVisible => &[
                "Raise SCIMP_COPY_POLL_ATTEMPTS or SCIMP_COPY_POLL_MAX_MS",
                "Check the copy status in the Service Catalog console",
                "Re-run the import; the copied product is reused once visible",
            ],
            Self::ImportIncomplete => &[
                "Inspect the failures listed in the import report",
                "Re-run the import after fixing them; completed steps are skipped",
            ],
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code_string(), self.message())
    }
}

/// Error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Function configuration (E001-E099)
    Config,
    /// Triggering notification (E100-E199)
    Event,
    /// Remote service calls (E200-E299)
    Remote,
    /// Reconciliation outcome (E300-E399)
    Import,
}

impl ErrorCategory {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Config => "Configuration",
            Self::Event => "Event",
            Self::Remote => "Remote",
            Self::Import => "Import",
        }
    }
}

/// Complete error entry with all metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Error code string (e.g., "SCIMP-E001")
    pub code: String,
    pub category: ErrorCategory,
    pub message: String,
    /// Steps to remediate the error
    pub remediation: Vec<String>,
}

impl ErrorEntry {
    /// Formats the error for display with full remediation steps.
    #[must_use]
    pub fn format_full(&self) -> String {
        let mut output = format!("[{}] {}\n", self.code, self.message);

        if !self.remediation.is_empty() {
            output.push_str("\nRemediation steps:\n");
            for (i, step) in self.remediation.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, step));
            }
        }

        output
    }
}
