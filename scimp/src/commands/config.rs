//! `scimp config`: show the resolved configuration.

use super::helpers::{format_rows, print_error};
use anyhow::{Result, bail};
use scimp_common::{ImportError, ImporterConfig};

pub fn run(json: bool) -> Result<()> {
    let config = load()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        println!("{}", format_rows(&config.describe()));
    }
    Ok(())
}

/// Load the importer configuration, printing the coded error on failure.
pub fn load() -> Result<ImporterConfig> {
    ImporterConfig::from_env().or_else(|err| {
        let err = ImportError::from(err);
        print_error(&err);
        bail!("invalid configuration ({})", err.code().code_string())
    })
}
