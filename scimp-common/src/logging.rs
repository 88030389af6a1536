//! Logging setup shared by every entry mode.
//!
//! Console output goes through a non-blocking writer; an optional daily
//! rolling file receives JSON lines. The returned guards must be held until
//! the process exits or buffered lines are lost.

use crate::config::{EnvError, EnvParser};
use anyhow::Context;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_PREFIX: &str = "scimp.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    pub dir: Option<PathBuf>,
    pub stderr: bool,
    pub ansi: bool,
    /// Problems found while reading the environment; logged once logging is up.
    pub warnings: Vec<EnvError>,
}

impl LogConfig {
    /// Read `SCIMP_LOG_LEVEL`, `SCIMP_LOG_FORMAT` and `SCIMP_LOG_DIR`.
    ///
    /// Invalid values fall back to defaults instead of failing, since there is
    /// nowhere to report them yet.
    pub fn from_env(default_level: &str) -> Self {
        let mut parser = EnvParser::new();
        let level = parser.get_log_level("LOG_LEVEL", default_level).value;
        let format = parser
            .get_choice("LOG_FORMAT", "pretty", &["pretty", "json"])
            .value;
        let dir = parser.get_optional_path("LOG_DIR").value;

        Self {
            level,
            format: LogFormat::parse(&format),
            dir,
            stderr: false,
            ansi: true,
            warnings: parser.take_errors(),
        }
    }

    pub fn with_stderr(mut self) -> Self {
        self.stderr = true;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Lambda captures stdout into CloudWatch; colour codes only add noise.
    pub fn for_lambda(self) -> Self {
        Self {
            format: LogFormat::Json,
            ansi: false,
            stderr: false,
            ..self
        }
    }
}

/// Flush guards for the non-blocking writers.
#[must_use = "dropping the guards stops log output"]
pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

pub fn init_logging(config: &LogConfig) -> anyhow::Result<LoggingGuards> {
    let filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("invalid log filter '{}'", config.level))?;

    let mut guards = Vec::new();

    let (console, guard) = if config.stderr {
        tracing_appender::non_blocking(std::io::stderr())
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };
    guards.push(guard);

    let pretty_layer = (config.format == LogFormat::Pretty).then(|| {
        fmt::layer()
            .with_writer(console.clone())
            .with_ansi(config.ansi)
            .with_target(false)
    });
    let json_layer = (config.format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_writer(console.clone())
            .with_ansi(false)
            .with_current_span(false)
    });

    let file_layer = match &config.dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            guards.push(guard);
            Some(fmt::layer().json().with_writer(writer).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    for warning in &config.warnings {
        tracing::warn!(var = warning.var(), "{warning}; using default");
    }

    Ok(LoggingGuards { _guards: guards })
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;
    use crate::config::env_test_lock;
    use std::env;

    const VARS: [&str; 3] = ["SCIMP_LOG_LEVEL", "SCIMP_LOG_FORMAT", "SCIMP_LOG_DIR"];

    fn cleanup_env() {
        for var in VARS {
            // SAFETY: Env access is serialized by env_test_lock
            unsafe { env::remove_var(var) };
        }
    }

    #[test]
    fn test_from_env_defaults() {
        let _guard = env_test_lock();
        cleanup_env();

        let config = LogConfig::from_env("info");
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.dir.is_none());
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn test_from_env_reads_values() {
        let _guard = env_test_lock();
        cleanup_env();
        // SAFETY: Env access is serialized by env_test_lock
        unsafe {
            env::set_var("SCIMP_LOG_LEVEL", "DEBUG");
            env::set_var("SCIMP_LOG_FORMAT", "json");
            env::set_var("SCIMP_LOG_DIR", "/tmp/scimp-logs");
        }

        let config = LogConfig::from_env("info");
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.dir, Some(PathBuf::from("/tmp/scimp-logs")));

        cleanup_env();
    }

    #[test]
    fn test_invalid_values_fall_back_with_warnings() {
        let _guard = env_test_lock();
        cleanup_env();
        // SAFETY: Env access is serialized by env_test_lock
        unsafe {
            env::set_var("SCIMP_LOG_LEVEL", "chatty");
            env::set_var("SCIMP_LOG_FORMAT", "xml");
        }

        let config = LogConfig::from_env("warn");
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.warnings.len(), 2);

        cleanup_env();
    }

    #[test]
    fn test_builders() {
        let _guard = env_test_lock();
        cleanup_env();

        let config = LogConfig::from_env("info").with_stderr().with_level("debug");
        assert!(config.stderr);
        assert_eq!(config.level, "debug");

        let lambda = config.for_lambda();
        assert_eq!(lambda.format, LogFormat::Json);
        assert!(!lambda.ansi);
        assert!(!lambda.stderr);
    }
}
