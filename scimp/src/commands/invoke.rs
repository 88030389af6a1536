//! `scimp invoke`: run one import from a notification file.

use super::config::load;
use super::helpers::{format_planned, format_report, print_error};
use crate::aws::{AwsCatalog, AwsIdentity, load_sdk_config};
use anyhow::{Result, bail};
use scimp_common::catalog::CatalogClient;
use scimp_common::{
    DryRunCatalog, ErrorCode, EventError, ImportError, ImportReport, ImporterConfig, Invocation,
    parse_notification,
};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

pub async fn run(event_path: &Path, dry_run: bool, json: bool) -> Result<()> {
    let payload = read_event(event_path)?;

    // Reject a bad payload before touching AWS.
    if let Err(err) = parse_notification(&payload) {
        return fail(ImportError::from(err));
    }

    let config = load()?;
    let sdk_config = load_sdk_config().await;
    let timeout = config.operation_timeout();
    let catalog = AwsCatalog::new(&sdk_config, timeout);
    let identity = AwsIdentity::new(&sdk_config, timeout);

    let report = if dry_run {
        let planner = DryRunCatalog::new(catalog);
        let report = execute(&planner, &identity, &config, &payload, true).await?;
        if !json {
            print!("{}", format_planned(&planner.actions()));
            println!();
        }
        report
    } else {
        execute(&catalog, &identity, &config, &payload, false).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report));
    }

    match report.into_result() {
        Ok(_) => Ok(()),
        Err(err) => fail(err),
    }
}

async fn execute(
    catalog: &dyn CatalogClient,
    identity: &AwsIdentity,
    config: &ImporterConfig,
    payload: &Value,
    dry_run: bool,
) -> Result<ImportReport> {
    match Invocation::new(catalog, identity, config)
        .dry_run(dry_run)
        .execute(payload)
        .await
    {
        Ok(report) => Ok(report),
        Err(err) => fail(err),
    }
}

fn read_event(path: &Path) -> Result<Value> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) => {
            let entry = ErrorCode::EventFileUnreadable.entry();
            eprintln!("error: cannot read {}: {err}", path.display());
            eprintln!();
            eprint!("{}", entry.format_full());
            bail!("unreadable event file ({})", entry.code);
        }
    };
    debug!(path = %path.display(), bytes = raw.len(), "Read notification file");

    match serde_json::from_str(&raw) {
        Ok(payload) => Ok(payload),
        Err(err) => fail(EventError::InvalidEnvelope(err.to_string()).into()),
    }
}

fn fail<T>(err: ImportError) -> Result<T> {
    print_error(&err);
    bail!("import failed ({})", err.code().code_string())
}
