//! Configuration system for the importer.
//!
//! This module provides:
//! - Environment variable parsing with type safety
//! - Source tracking for debugging
//! - The validated [`ImporterConfig`] handed to the entrypoint

pub mod env;
pub mod importer;
pub mod source;

pub use env::{EnvError, EnvParser};
pub use importer::{
    ConfigError, CopyPollConfig, FailureMode, ImporterConfig, LAUNCH_ROLE_VAR, PRINCIPAL_ROLE_VAR,
};
pub use source::{ConfigSource, Sourced};

#[cfg(test)]
pub(crate) fn env_test_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex, OnceLock};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
