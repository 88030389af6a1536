//! Shared helper functions for scimp commands.

use scimp_common::{ImportError, ImportReport, PlannedAction};

/// Print an import error with its code and remediation steps to stderr.
pub fn print_error(err: &ImportError) {
    let entry = err.code().entry();
    eprintln!("{} error: {err}", entry.category.name());
    eprintln!();
    eprint!("{}", entry.format_full());
}

/// Render rows as `name  value  (origin)` with aligned columns.
pub fn format_rows(rows: &[(&str, String, String)]) -> String {
    let name_width = rows.iter().map(|(name, _, _)| name.len()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, value, _)| value.len()).max().unwrap_or(0);

    rows.iter()
        .map(|(name, value, origin)| {
            format!("{name:<name_width$}  {value:<value_width$}  ({origin})")
                .trim_end()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Human-readable summary of a finished import.
pub fn format_report(report: &ImportReport) -> String {
    let c = &report.counters;
    let mut out = format!(
        "Import {} ({}){}\n",
        report.invocation_id,
        report.share_type,
        if report.dry_run { " [dry run]" } else { "" }
    );
    let rows = [
        ("shares accepted", c.shares_accepted),
        ("portfolios created", c.portfolios_created),
        ("portfolios reused", c.portfolios_reused),
        ("principals associated", c.principals_associated),
        ("products copied", c.products_copied),
        ("products reused", c.products_reused),
        ("products associated", c.products_associated),
        ("constraints created", c.constraints_created),
        ("constraints skipped", c.constraints_skipped),
    ];
    for (label, count) in rows {
        out.push_str(&format!("  {label:<22} {count}\n"));
    }

    if !report.failures.is_empty() {
        out.push_str(&format!("\n{} failure(s):\n", report.failures.len()));
        for failure in &report.failures {
            out.push_str(&format!(
                "  [{}] {}: {}\n",
                failure.code, failure.scope, failure.message
            ));
        }
    }
    out
}

pub fn format_planned(actions: &[PlannedAction]) -> String {
    let mut out = format!("{} planned write(s):\n", actions.len());
    for (i, action) in actions.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {} {}",
            i + 1,
            action.operation,
            action.target
        ));
        if !action.detail.is_empty() {
            out.push_str(&format!(" ({})", action.detail));
        }
        out.push('\n');
    }
    out
}
