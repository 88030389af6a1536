//! Validated importer configuration.
//!
//! Every value is read and checked before anything is derived from it, so a
//! missing role name fails the invocation before any ARN is built.

use super::env::{EnvError, EnvParser};
use super::source::Sourced;
use crate::poll::PollPolicy;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Role granted end-user access to every mirrored portfolio.
pub const PRINCIPAL_ROLE_VAR: &str = "default_iam_principal_role_name";
/// Role assumed by the launch constraint when products are provisioned.
pub const LAUNCH_ROLE_VAR: &str = "default_launch_constraint";

/// Configuration could not be loaded. Carries every problem found.
#[derive(Debug, Clone, Error)]
#[error("invalid configuration: {}", summarize(.errors))]
pub struct ConfigError {
    pub errors: Vec<EnvError>,
}

fn summarize(errors: &[EnvError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConfigError {
    /// True if any error is a missing required variable.
    pub fn has_missing_required(&self) -> bool {
        self.errors
            .iter()
            .any(|e| matches!(e, EnvError::Missing { .. }))
    }
}

/// How a failure inside one portfolio or product is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// First failure aborts the whole invocation.
    FailFast,
    /// Record the failure, move on, fail at the end.
    ContinueOnError,
}

impl fmt::Display for FailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FailFast => write!(f, "fail-fast"),
            Self::ContinueOnError => write!(f, "continue-on-error"),
        }
    }
}

/// Visibility polling after a product copy.
#[derive(Debug, Clone, Serialize)]
pub struct CopyPollConfig {
    pub attempts: Sourced<u32>,
    pub base_delay_ms: Sourced<u64>,
    pub max_delay_ms: Sourced<u64>,
}

/// Fully validated importer configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ImporterConfig {
    pub principal_role_name: Sourced<String>,
    pub launch_role_name: Sourced<String>,
    pub partition: Sourced<String>,
    pub accept_language: Sourced<String>,
    pub continue_on_error: Sourced<bool>,
    pub copy_poll: CopyPollConfig,
    pub operation_timeout_ms: Sourced<Option<u64>>,
}

impl ImporterConfig {
    /// Load from the process environment, collecting every error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut parser = EnvParser::new();

        let principal_role_name = parser.get_required(PRINCIPAL_ROLE_VAR);
        let launch_role_name = parser.get_required(LAUNCH_ROLE_VAR);
        let partition = parser.get_string("PARTITION", "aws");
        let accept_language = parser.get_string("ACCEPT_LANGUAGE", "en");
        let continue_on_error = parser.get_bool("CONTINUE_ON_ERROR", false);
        let copy_poll = CopyPollConfig {
            attempts: parser.get_u32_range("COPY_POLL_ATTEMPTS", 8, 1, 60),
            base_delay_ms: parser.get_u64_range("COPY_POLL_BASE_MS", 2_000, 0, 300_000),
            max_delay_ms: parser.get_u64_range("COPY_POLL_MAX_MS", 20_000, 0, 900_000),
        };
        let operation_timeout_ms =
            parser.get_optional_u64_range("OPERATION_TIMEOUT_MS", 100, 900_000);

        let mut errors = parser.take_errors();
        if copy_poll.base_delay_ms.value > copy_poll.max_delay_ms.value {
            errors.push(EnvError::InvalidValue {
                var: "SCIMP_COPY_POLL_BASE_MS".to_string(),
                expected: format!(
                    "at most SCIMP_COPY_POLL_MAX_MS ({})",
                    copy_poll.max_delay_ms.value
                ),
                value: copy_poll.base_delay_ms.value.to_string(),
            });
        }
        if !errors.is_empty() {
            return Err(ConfigError { errors });
        }

        Ok(Self {
            principal_role_name,
            launch_role_name,
            partition,
            accept_language,
            continue_on_error,
            copy_poll,
            operation_timeout_ms,
        })
    }

    /// Defaults for everything but the role names.
    pub fn new(principal_role_name: impl Into<String>, launch_role_name: impl Into<String>) -> Self {
        Self {
            principal_role_name: Sourced::default_value(principal_role_name.into()),
            launch_role_name: Sourced::default_value(launch_role_name.into()),
            partition: Sourced::default_value("aws".to_string()),
            accept_language: Sourced::default_value("en".to_string()),
            continue_on_error: Sourced::default_value(false),
            copy_poll: CopyPollConfig {
                attempts: Sourced::default_value(8),
                base_delay_ms: Sourced::default_value(2_000),
                max_delay_ms: Sourced::default_value(20_000),
            },
            operation_timeout_ms: Sourced::default_value(None),
        }
    }

    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.continue_on_error = Sourced::default_value(mode == FailureMode::ContinueOnError);
        self
    }

    pub fn with_copy_poll(mut self, attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.copy_poll = CopyPollConfig {
            attempts: Sourced::default_value(attempts),
            base_delay_ms: Sourced::default_value(base_delay_ms),
            max_delay_ms: Sourced::default_value(max_delay_ms),
        };
        self
    }

    pub fn failure_mode(&self) -> FailureMode {
        if self.continue_on_error.value {
            FailureMode::ContinueOnError
        } else {
            FailureMode::FailFast
        }
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            max_attempts: self.copy_poll.attempts.value,
            base_delay: Duration::from_millis(self.copy_poll.base_delay_ms.value),
            max_delay: Duration::from_millis(self.copy_poll.max_delay_ms.value),
            ..PollPolicy::default()
        }
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.value.map(Duration::from_millis)
    }

    /// Rows of (setting, value, origin) for display.
    pub fn describe(&self) -> Vec<(&'static str, String, String)> {
        let timeout = self
            .operation_timeout_ms
            .value
            .map(|ms| format!("{ms}ms"))
            .unwrap_or_else(|| "transport default".to_string());

        vec![
            (
                PRINCIPAL_ROLE_VAR,
                self.principal_role_name.value.clone(),
                self.principal_role_name.describe_source(),
            ),
            (
                LAUNCH_ROLE_VAR,
                self.launch_role_name.value.clone(),
                self.launch_role_name.describe_source(),
            ),
            (
                "partition",
                self.partition.value.clone(),
                self.partition.describe_source(),
            ),
            (
                "accept_language",
                self.accept_language.value.clone(),
                self.accept_language.describe_source(),
            ),
            (
                "failure_mode",
                self.failure_mode().to_string(),
                self.continue_on_error.describe_source(),
            ),
            (
                "copy_poll_attempts",
                self.copy_poll.attempts.value.to_string(),
                self.copy_poll.attempts.describe_source(),
            ),
            (
                "copy_poll_base_delay",
                format!("{}ms", self.copy_poll.base_delay_ms.value),
                self.copy_poll.base_delay_ms.describe_source(),
            ),
            (
                "copy_poll_max_delay",
                format!("{}ms", self.copy_poll.max_delay_ms.value),
                self.copy_poll.max_delay_ms.describe_source(),
            ),
            (
                "operation_timeout",
                timeout,
                self.operation_timeout_ms.describe_source(),
            ),
        ]
    }
}
