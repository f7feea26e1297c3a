//! Terminal output for verification results.

use std::fmt::Write;

use super::batch::BatchStats;
use super::outcome::{VerificationOutcome, VerificationReport};

const RULE_WIDTH: usize = 60;

/// Full report for a single issue.
pub fn format_report(report: &VerificationReport, verbose: bool) -> String {
    match report {
        VerificationReport::Completed(outcome) => format_outcome(outcome, verbose),
        VerificationReport::Errored { issue_id, error } => {
            format!("[ERROR] {}: {}\n", issue_id, error)
        }
    }
}

fn format_outcome(outcome: &VerificationOutcome, verbose: bool) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);

    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(out, "Verification: {}", outcome.issue_id);
    let _ = writeln!(out, "{}", rule);
    let _ = writeln!(
        out,
        "Status: {} | Pattern: {} | Depth: {}",
        outcome.status.as_deref().unwrap_or("UNKNOWN"),
        outcome.pattern,
        outcome.depth
    );
    if outcome.used_embedded_commands {
        let _ = writeln!(out, "Source: embedded verification commands");
    }
    if !outcome.target_paths.is_empty() {
        let _ = writeln!(out, "Targets: {}", outcome.target_paths.join(", "));
    }
    if !outcome.unresolved_dependencies.is_empty() {
        let _ = writeln!(
            out,
            "[WARN] Unresolved dependencies: {}",
            outcome.unresolved_dependencies.join(", ")
        );
    }
    let _ = writeln!(out);

    if outcome.checks.is_empty() {
        let _ = writeln!(out, "[WARN] No checks to run");
    }

    for check in &outcome.checks {
        let marker = if check.passed { "[PASS]" } else { "[FAIL]" };
        let _ = writeln!(out, "{} {}", marker, check.name);

        if check.was_auto_corrected {
            let _ = writeln!(
                out,
                "       auto-corrected: {}",
                check.correction_note.as_deref().unwrap_or_default()
            );
        }
        if !check.passed {
            let _ = writeln!(
                out,
                "       expected exit {}, got {}: {}",
                check.expected_exit, check.actual_exit, check.error_message
            );
        }
        if verbose {
            let _ = writeln!(
                out,
                "       command: {}",
                check.corrected_command.as_deref().unwrap_or(&check.command)
            );
            let output = check.output.trim();
            if !output.is_empty() {
                for line in output.lines() {
                    let _ = writeln!(out, "       | {}", line);
                }
            }
        }
    }

    let _ = writeln!(out);
    let verdict = if outcome.all_passed { "VERIFIED" } else { "NOT VERIFIED" };
    let _ = writeln!(
        out,
        "{}: {}/{} checks passed (confidence {}%)",
        verdict, outcome.passed_count, outcome.total_checks, outcome.confidence
    );

    if let Some(path) = &outcome.evidence_path {
        let _ = writeln!(out, "Evidence: {}", path.display());
    }
    if let Some(error) = &outcome.evidence_error {
        let _ = writeln!(out, "[WARN] Evidence not saved: {}", error);
    }
    if outcome.status_updated {
        let _ = writeln!(out, "Issue record updated with verification date");
    }
    if let Some(error) = &outcome.update_error {
        let _ = writeln!(out, "[WARN] Issue record not updated: {}", error);
    }

    out
}

/// One-line summary used when listing a lane.
pub fn format_lane_line(report: &VerificationReport) -> String {
    match report {
        VerificationReport::Completed(outcome) => {
            let marker = if outcome.all_passed { "[PASS]" } else { "[FAIL]" };
            let mut line = format!(
                "  {} {} ({}/{}, {}%)",
                marker, outcome.issue_id, outcome.passed_count, outcome.total_checks, outcome.confidence
            );
            if !outcome.unresolved_dependencies.is_empty() {
                let _ = write!(
                    line,
                    " blocked by {}",
                    outcome.unresolved_dependencies.join(", ")
                );
            }
            line
        }
        VerificationReport::Errored { issue_id, error } => {
            format!("  [ERROR] {}: {}", issue_id, error)
        }
    }
}

/// Totals block printed after a lane or the whole run.
pub fn format_summary(title: &str, stats: &BatchStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(
        out,
        "  Total: {}  Passed: {}  Failed: {}  Pass rate: {}%",
        stats.total,
        stats.passed,
        stats.failed,
        stats.pass_rate()
    );
    if stats.errors > 0 {
        let _ = writeln!(out, "  Errors: {}", stats.errors);
    }
    out
}
