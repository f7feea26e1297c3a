//! Aggregated verification outcomes.

use std::path::PathBuf;

use chrono::{DateTime, Local};

use crate::issue::IssueRecord;
use crate::pattern::Depth;

use super::check::CheckResult;

/// Pattern name reported when an issue's embedded commands were run.
pub const EMBEDDED_COMMANDS: &str = "embedded_commands";

/// Result of verifying one issue.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub issue_id: String,
    pub lane: String,
    /// Status declared in the issue record.
    pub status: Option<String>,
    /// Declared pattern name, or `embedded_commands`.
    pub pattern: String,
    pub depth: Depth,
    pub depends_on: Vec<String>,
    /// Dependencies that are not resolved, possibly tagged `(not found)`.
    pub unresolved_dependencies: Vec<String>,
    pub target_paths: Vec<String>,
    pub checks: Vec<CheckResult>,
    pub passed_count: usize,
    pub failed_count: usize,
    pub total_checks: usize,
    /// Percentage of passed checks, truncated.
    pub confidence: u32,
    pub all_passed: bool,
    pub timestamp: DateTime<Local>,
    pub used_embedded_commands: bool,
    pub evidence_path: Option<PathBuf>,
    pub evidence_error: Option<String>,
    pub status_updated: bool,
    pub update_error: Option<String>,
}

impl VerificationOutcome {
    /// Aggregate the check results for an issue.
    pub fn new(
        issue: &IssueRecord,
        depth: Depth,
        target_paths: Vec<String>,
        checks: Vec<CheckResult>,
        used_embedded_commands: bool,
    ) -> Self {
        let pattern = issue
            .frontmatter
            .verification_pattern
            .clone()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| EMBEDDED_COMMANDS.to_string());

        let mut outcome = Self {
            issue_id: issue.id.clone(),
            lane: issue.lane(),
            status: issue.frontmatter.status.clone(),
            pattern,
            depth,
            depends_on: issue.depends_on().to_vec(),
            unresolved_dependencies: Vec::new(),
            target_paths,
            checks,
            passed_count: 0,
            failed_count: 0,
            total_checks: 0,
            confidence: 0,
            all_passed: false,
            timestamp: Local::now(),
            used_embedded_commands,
            evidence_path: None,
            evidence_error: None,
            status_updated: false,
            update_error: None,
        };
        outcome.recompute();
        outcome
    }

    /// Append the synthetic dependency failure when anything is unresolved.
    pub fn apply_dependency_gate(&mut self, unresolved: Vec<String>) {
        if unresolved.is_empty() {
            return;
        }
        self.checks
            .push(CheckResult::unresolved_dependencies(&unresolved));
        self.unresolved_dependencies = unresolved;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.total_checks = self.checks.len();
        self.passed_count = self.checks.iter().filter(|c| c.passed).count();
        self.failed_count = self.total_checks - self.passed_count;
        self.confidence = confidence_score(self.passed_count, self.total_checks);
        self.all_passed = self.total_checks > 0 && self.failed_count == 0;
    }
}

/// `passed / total * 100`, truncated; zero when there are no checks.
pub fn confidence_score(passed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (passed * 100 / total) as u32
}

/// Result of attempting to verify one issue.
#[derive(Debug, Clone)]
pub enum VerificationReport {
    Completed(Box<VerificationOutcome>),
    /// The issue record could not be located or parsed.
    Errored { issue_id: String, error: String },
}

impl VerificationReport {
    pub fn issue_id(&self) -> &str {
        match self {
            VerificationReport::Completed(outcome) => &outcome.issue_id,
            VerificationReport::Errored { issue_id, .. } => issue_id,
        }
    }

    pub fn passed(&self) -> bool {
        match self {
            VerificationReport::Completed(outcome) => outcome.all_passed,
            VerificationReport::Errored { .. } => false,
        }
    }

    pub fn outcome(&self) -> Option<&VerificationOutcome> {
        match self {
            VerificationReport::Completed(outcome) => Some(outcome.as_ref()),
            VerificationReport::Errored { .. } => None,
        }
    }
}
