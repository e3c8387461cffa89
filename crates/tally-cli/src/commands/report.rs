//! Human-readable report output.

use colored::Colorize;
use tally::{RunMode, RunReport, Severity};

/// Print a run report to stdout.
pub fn print(report: &RunReport) {
    let mode = match report.mode {
        RunMode::Validate => "validate",
        RunMode::Fix => "fix",
    };
    println!();
    println!(
        "{} {} ({} tables declared)",
        "Tally".cyan().bold(),
        mode,
        report.summary.tables_declared
    );

    if report.is_clean() {
        println!("{} schema is valid", "ok:".green().bold());
    } else {
        println!(
            "{} {} error(s)",
            "failed:".red().bold(),
            report.summary.errors
        );
    }
    if report.summary.warnings > 0 {
        println!(
            "{} {} warning(s)",
            "note:".yellow().bold(),
            report.summary.warnings
        );
    }

    if !report.issues.is_empty() {
        println!();
        for issue in &report.issues {
            let tag = match issue.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
            };
            match &issue.suggested_fix {
                Some(fix) => println!(
                    "  {} [{}] {} (suggested: '{}')",
                    tag, issue.table, issue.message, fix
                ),
                None => println!("  {} [{}] {}", tag, issue.table, issue.message),
            }
        }
    }

    if !report.suggestions.is_empty() {
        println!();
        println!(
            "{} {} key suggestion(s)",
            "Inference:".cyan().bold(),
            report.suggestions.len()
        );
        for s in &report.suggestions {
            println!(
                "  [{}] row {}: {} '{}' -> '{}' (confidence {:.2}; {})",
                s.table, s.row_index, s.column, s.current_value, s.proposed_value, s.confidence,
                s.evidence
            );
        }
    }

    if !report.applied.is_empty() {
        println!();
        println!(
            "{} {} change(s) written",
            "Applied:".green().bold(),
            report.applied.len()
        );
        for r in &report.applied {
            println!(
                "  [{}] row {}: {} '{}' -> '{}'",
                r.table, r.row_index, r.column, r.old_value, r.new_value
            );
        }
    }

    if !report.skipped.is_empty() {
        println!();
        println!(
            "{} {} suggestion(s) below threshold, not applied",
            "Skipped:".yellow().bold(),
            report.skipped.len()
        );
    }

    println!();
    for t in &report.summary.per_table {
        println!(
            "  {}: {} error(s), {} warning(s), {} suggestion(s), {} applied, {} skipped",
            t.table.white().bold(),
            t.errors,
            t.warnings,
            t.suggestions,
            t.applied,
            t.skipped
        );
    }
}
