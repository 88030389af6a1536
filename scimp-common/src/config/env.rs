//! Typed environment variable parsing.

use super::source::Sourced;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during environment variable parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvError {
    /// A required variable is unset or empty.
    #[error("Missing required variable {var}")]
    Missing { var: String },

    /// Invalid value for a variable.
    #[error("Invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },

    /// Value out of valid range.
    #[error("Value out of range for {var}: {value} (valid: {min}..={max})")]
    OutOfRange {
        var: String,
        value: String,
        min: String,
        max: String,
    },

    /// Invalid log level.
    #[error("Invalid log level for {var}: {value}")]
    InvalidLogLevel { var: String, value: String },
}

impl EnvError {
    /// Name of the offending variable.
    pub fn var(&self) -> &str {
        match self {
            Self::Missing { var }
            | Self::InvalidValue { var, .. }
            | Self::OutOfRange { var, .. }
            | Self::InvalidLogLevel { var, .. } => var,
        }
    }
}

/// Reads `SCIMP_`-prefixed variables, collecting every problem instead of
/// stopping at the first.
pub struct EnvParser {
    prefix: &'static str,
    errors: Vec<EnvError>,
}

impl EnvParser {
    pub fn new() -> Self {
        Self {
            prefix: "SCIMP_",
            errors: Vec::new(),
        }
    }

    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    #[cfg(test)]
    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Prefixed variable name and its raw value, if set.
    fn lookup(&self, name: &str) -> (String, Option<String>) {
        let var = format!("{}{}", self.prefix, name);
        let value = env::var(&var).ok();
        (var, value)
    }

    /// Required value by its exact, unprefixed name. Blank counts as unset.
    pub fn get_required(&mut self, var_name: &str) -> Sourced<String> {
        match env::var(var_name) {
            Ok(value) if !value.trim().is_empty() => {
                Sourced::from_env(value.trim().to_string(), var_name)
            }
            _ => {
                self.errors.push(EnvError::Missing {
                    var: var_name.to_string(),
                });
                Sourced::default_value(String::new())
            }
        }
    }

    pub fn get_string(&mut self, name: &str, default: &str) -> Sourced<String> {
        match self.lookup(name) {
            (var, Some(value)) if !value.trim().is_empty() => Sourced::from_env(value, var),
            _ => Sourced::default_value(default.to_string()),
        }
    }

    /// Accepts 1/true/yes/on and 0/false/no/off, case-insensitive. Empty is false.
    pub fn get_bool(&mut self, name: &str, default: bool) -> Sourced<bool> {
        let (var, Some(value)) = self.lookup(name) else {
            return Sourced::default_value(default);
        };
        let parsed = match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" | "" => false,
            _ => {
                self.errors.push(EnvError::InvalidValue {
                    var: var.clone(),
                    expected: "boolean (true/false/1/0/yes/no)".to_string(),
                    value,
                });
                default
            }
        };
        Sourced::from_env(parsed, var)
    }

    fn get_in_range<T>(&mut self, name: &str, default: T, min: T, max: T, kind: &str) -> Sourced<T>
    where
        T: FromStr + PartialOrd + Display + Copy,
    {
        let (var, Some(value)) = self.lookup(name) else {
            return Sourced::default_value(default);
        };
        match value.trim().parse::<T>() {
            Ok(n) if n >= min && n <= max => Sourced::from_env(n, var),
            Ok(n) => {
                self.errors.push(EnvError::OutOfRange {
                    var: var.clone(),
                    value: n.to_string(),
                    min: min.to_string(),
                    max: max.to_string(),
                });
                Sourced::from_env(default, var)
            }
            Err(_) => {
                self.errors.push(EnvError::InvalidValue {
                    var,
                    expected: kind.to_string(),
                    value,
                });
                Sourced::default_value(default)
            }
        }
    }

    pub fn get_u32_range(&mut self, name: &str, default: u32, min: u32, max: u32) -> Sourced<u32> {
        self.get_in_range(name, default, min, max, "unsigned 32-bit integer")
    }

    pub fn get_u64_range(&mut self, name: &str, default: u64, min: u64, max: u64) -> Sourced<u64> {
        self.get_in_range(name, default, min, max, "unsigned 64-bit integer")
    }

    /// Like [`get_u64_range`](Self::get_u64_range) but unset or blank means `None`.
    pub fn get_optional_u64_range(&mut self, name: &str, min: u64, max: u64) -> Sourced<Option<u64>> {
        match self.lookup(name) {
            (var, Some(value)) if value.trim().is_empty() => Sourced::from_env(None, var),
            (_, Some(_)) => self.get_u64_range(name, min, min, max).map(Some),
            (_, None) => Sourced::default_value(None),
        }
    }

    /// Optional path; a leading `~/` expands to the home directory.
    pub fn get_optional_path(&mut self, name: &str) -> Sourced<Option<PathBuf>> {
        match self.lookup(name) {
            (var, Some(value)) if value.trim().is_empty() => Sourced::from_env(None, var),
            (var, Some(value)) => Sourced::from_env(Some(expand_home(value.trim())), var),
            (_, None) => Sourced::default_value(None),
        }
    }

    pub fn get_log_level(&mut self, name: &str, default: &str) -> Sourced<String> {
        const LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

        let (var, Some(value)) = self.lookup(name) else {
            return Sourced::default_value(default.to_string());
        };
        let level = value.trim().to_lowercase();
        if LEVELS.contains(&level.as_str()) {
            Sourced::from_env(level, var)
        } else {
            self.errors.push(EnvError::InvalidLogLevel {
                var: var.clone(),
                value,
            });
            Sourced::from_env(default.to_string(), var)
        }
    }

    /// One of a fixed set of lowercase choices.
    pub fn get_choice(
        &mut self,
        name: &str,
        default: &'static str,
        choices: &[&'static str],
    ) -> Sourced<String> {
        let (var, Some(value)) = self.lookup(name) else {
            return Sourced::default_value(default.to_string());
        };
        let choice = value.trim().to_lowercase();
        if choices.contains(&choice.as_str()) {
            Sourced::from_env(choice, var)
        } else {
            self.errors.push(EnvError::InvalidValue {
                var,
                expected: format!("one of {}", choices.join("/")),
                value,
            });
            Sourced::default_value(default.to_string())
        }
    }
}

impl Default for EnvParser {
    fn default() -> Self {
        Self::new()
    }
}

fn expand_home(raw: &str) -> PathBuf {
    raw.strip_prefix("~/")
        .and_then(|rest| dirs::home_dir().map(|home| home.join(rest)))
        .unwrap_or_else(|| PathBuf::from(raw))
}
