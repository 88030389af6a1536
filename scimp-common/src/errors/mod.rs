//! Error types for the importer.
//!
//! [`ImportError`] is what a failed invocation returns; every variant maps to
//! an [`ErrorCode`] from the catalog.

pub mod catalog;

pub use catalog::{ErrorCategory, ErrorCode, ErrorEntry};

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::event::EventError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Remote(#[from] CatalogError),

    #[error("copied product '{product}' was not visible after {attempts} probes")]
    CopyNotVisible { product: String, attempts: u32 },

    #[error("import incomplete: {failed} portfolio/product step(s) failed")]
    Incomplete { failed: usize },
}

impl ImportError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Config(err) if err.has_missing_required() => ErrorCode::ConfigMissingRole,
            Self::Config(_) => ErrorCode::ConfigInvalidValue,
            Self::Event(EventError::MissingPortfolioId) => ErrorCode::EventMissingPortfolio,
            Self::Event(_) => ErrorCode::EventMalformed,
            Self::Remote(_) => ErrorCode::RemoteCallFailed,
            Self::CopyNotVisible { .. } => ErrorCode::RemoteCopyNotVisible,
            Self::Incomplete { .. } => ErrorCode::ImportIncomplete,
        }
    }

    /// Log the error with its code and remediation steps.
    pub fn log(&self) {
        let code = self.code();
        error!(
            code = %code.code_string(),
            category = code.category().name(),
            error = %self,
            "{}",
            code.entry().format_full()
        );
    }
}

pub type Result<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogOperation;
    use crate::config::EnvError;

    #[test]
    fn test_codes_for_variants() {
        let missing = ImportError::Config(ConfigError {
            errors: vec![EnvError::Missing {
                var: "default_launch_constraint".to_string(),
            }],
        });
        assert_eq!(missing.code(), ErrorCode::ConfigMissingRole);

        let invalid = ImportError::Config(ConfigError {
            errors: vec![EnvError::InvalidLogLevel {
                var: "SCIMP_LOG_LEVEL".to_string(),
                value: "loud".to_string(),
            }],
        });
        assert_eq!(invalid.code(), ErrorCode::ConfigInvalidValue);

        assert_eq!(
            ImportError::from(EventError::NoRecords).code(),
            ErrorCode::EventMalformed
        );
        assert_eq!(
            ImportError::from(EventError::MissingPortfolioId).code(),
            ErrorCode::EventMissingPortfolio
        );
        assert_eq!(
            ImportError::from(CatalogError::new(CatalogOperation::CreateConstraint, "denied"))
                .code(),
            ErrorCode::RemoteCallFailed
        );
    }

    #[test]
    fn test_remote_error_message_is_transparent() {
        let err = ImportError::from(CatalogError::new(
            CatalogOperation::AssociateProduct,
            "ResourceNotFoundException",
        ));
        assert_eq!(
            err.to_string(),
            "AssociateProductWithPortfolio failed: ResourceNotFoundException"
        );
    }
}
