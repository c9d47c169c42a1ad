//! Console output.
//!
//! The run log is the durable record; this module only renders what a run did
//! for whoever invoked it from a terminal.

use crate::coordinator::{PlannedMove, RunSummary};
use colored::*;
use std::collections::BTreeMap;

/// Renders run results to the terminal.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints the files a run moved, a per-status table and the report path.
    pub fn run_summary(summary: &RunSummary) {
        if summary.outcomes.is_empty() && summary.isolated_failures.is_empty() {
            Self::info("No files to process.");
            return;
        }

        for outcome in &summary.outcomes {
            if outcome.is_moved() {
                Self::success(&format!(
                    "{} → {} ({})",
                    outcome.filename, outcome.moved_to, outcome.status
                ));
            } else {
                Self::warning(&format!(
                    "{} left in {}: destination already has a file with that name",
                    outcome.filename, outcome.moved_to
                ));
            }
        }
        for failure in &summary.isolated_failures {
            Self::error(&format!("{}: {}", failure.path.display(), failure.reason));
        }

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for outcome in &summary.outcomes {
            *counts.entry(outcome.status.as_str()).or_insert(0) += 1;
        }
        if !summary.isolated_failures.is_empty() {
            counts.insert("Skipped", summary.isolated_failures.len());
        }
        Self::summary_table(&counts);

        if let Some(path) = &summary.report_path {
            println!();
            Self::info(&format!("Report generated at {}", path.display()));
        }
    }

    /// Prints what a run would do.
    pub fn plan(plan: &[PlannedMove]) {
        if plan.is_empty() {
            Self::dry_run_notice("No files to process.");
            return;
        }

        Self::dry_run_notice("Files would be moved as follows:");
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for planned in plan {
            println!(
                " - {} → {} ({})",
                planned.filename,
                planned.destination.display(),
                planned.disposition
            );
            *counts.entry(planned.disposition.label()).or_insert(0) += 1;
        }
        Self::summary_table(&counts);
        Self::dry_run_notice("No files were moved.");
    }

    /// Prints file counts by status with a total row.
    fn summary_table(counts: &BTreeMap<&str, usize>) {
        Self::header("SUMMARY");

        let width = counts.keys().map(|s| s.len()).max().unwrap_or(0).max(6);
        let total: usize = counts.values().sum();

        println!("{:<width$} | {}", "Status".bold(), "Files".bold(), width = width);
        println!("{}", "-".repeat(width + 10));
        for (status, count) in counts {
            println!(
                "{:<width$} | {}",
                status,
                count.to_string().green(),
                width = width
            );
        }
        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {}",
            "Total".bold(),
            total.to_string().green().bold(),
            width = width
        );
    }
}
