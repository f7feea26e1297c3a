//! Bounded-parallel verification of many issues.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, error};

use crate::runner::CommandExecutor;

use super::outcome::VerificationReport;
use super::verifier::{Verifier, VerifyOptions};

/// Totals over a set of reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Issues that could not be verified at all. Also counted in `failed`.
    pub errors: usize,
}

impl BatchStats {
    pub fn from_reports(reports: &[VerificationReport]) -> Self {
        let mut stats = Self {
            total: reports.len(),
            ..Self::default()
        };
        for report in reports {
            if report.passed() {
                stats.passed += 1;
            } else {
                stats.failed += 1;
            }
            if matches!(report, VerificationReport::Errored { .. }) {
                stats.errors += 1;
            }
        }
        stats
    }

    pub fn merge(self, other: Self) -> Self {
        Self {
            total: self.total + other.total,
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
            errors: self.errors + other.errors,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Whole-number pass rate; zero for an empty batch.
    pub fn pass_rate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.passed * 100 / self.total) as u32
    }
}

/// Verify issues concurrently, at most `jobs` at a time.
///
/// Duplicate identifiers are verified once. Reports come back in the order
/// the identifiers were first given, whatever order the runs finish in.
pub async fn verify_batch<E>(
    verifier: Arc<Verifier<E>>,
    issue_ids: &[String],
    options: VerifyOptions,
    jobs: usize,
) -> Vec<VerificationReport>
where
    E: CommandExecutor + 'static,
{
    let mut seen = HashSet::new();
    let unique: Vec<String> = issue_ids
        .iter()
        .filter(|id| seen.insert(dedupe_key(id)))
        .cloned()
        .collect();

    let jobs = jobs.max(1);
    debug!("Verifying {} issues with {} jobs", unique.len(), jobs);
    let semaphore = Arc::new(Semaphore::new(jobs));

    let handles: Vec<_> = unique
        .into_iter()
        .map(|issue_id| {
            let verifier = Arc::clone(&verifier);
            let semaphore = Arc::clone(&semaphore);
            let task_id = issue_id.clone();
            let handle = tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                verifier.verify_issue(&task_id, options).await
            });
            (issue_id, handle)
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for (issue_id, handle) in handles {
        let report = match handle.await {
            Ok(report) => report,
            Err(e) => {
                error!("Verification task for {} failed: {}", issue_id, e);
                VerificationReport::Errored {
                    issue_id,
                    error: format!("Verification task failed: {}", e),
                }
            }
        };
        reports.push(report);
    }
    reports
}

/// Identity of an issue id for deduplication: trimmed, lane letter uppercased.
fn dedupe_key(issue_id: &str) -> String {
    let id = issue_id.trim();
    let mut chars = id.chars();
    match chars.next() {
        Some(lane) => format!("{}{}", lane.to_ascii_uppercase(), chars.as_str()),
        None => String::new(),
    }
}
