//! Per-issue verification flow.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::command::{Classification, Correction, auto_correct, classify};
use crate::config::VerifierConfig;
use crate::issue::{IssueRecord, IssueStore};
use crate::pattern::{Depth, PatternCatalog, PatternVariables, ResolvedCheck};
use crate::runner::{CommandExecutor, ShellExecutor};

use super::check::{CheckExpectation, CheckResult, CheckSpec};
use super::dependency::DependencyGate;
use super::evidence::EvidenceStore;
use super::outcome::{VerificationOutcome, VerificationReport};

/// Per-run options for a verification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Depth requested by the caller, overriding the record's.
    pub depth: Option<Depth>,
    /// Record a successful verification in the issue file.
    pub update_status: bool,
}

/// Verifies issues against their embedded checks or catalog patterns.
pub struct Verifier<E: CommandExecutor = ShellExecutor> {
    catalog: Arc<PatternCatalog>,
    store: IssueStore,
    evidence: EvidenceStore,
    executor: E,
    command_timeout: Duration,
}

impl Verifier<ShellExecutor> {
    /// Verifier that runs checks through `sh` in the repository root.
    pub fn new(config: &VerifierConfig, catalog: Arc<PatternCatalog>) -> Self {
        Self::with_executor(config, catalog, ShellExecutor::new(&config.root))
    }
}

impl<E: CommandExecutor> Verifier<E> {
    pub fn with_executor(config: &VerifierConfig, catalog: Arc<PatternCatalog>, executor: E) -> Self {
        Self {
            catalog,
            store: IssueStore::new(config.issues_path()),
            evidence: EvidenceStore::new(config.evidence_path()),
            executor,
            command_timeout: config.command_timeout,
        }
    }

    pub fn store(&self) -> &IssueStore {
        &self.store
    }

    /// Verify one issue end to end.
    ///
    /// Record errors become [`VerificationReport::Errored`]; persistence
    /// failures are recorded on the outcome and never abort the run.
    pub async fn verify_issue(&self, issue_id: &str, options: VerifyOptions) -> VerificationReport {
        let issue = match self.store.load(issue_id) {
            Ok(issue) => issue,
            Err(e) => {
                warn!("Cannot verify {}: {}", issue_id, e);
                return VerificationReport::Errored {
                    issue_id: issue_id.to_string(),
                    error: e.to_string(),
                };
            }
        };

        let depth = options
            .depth
            .or_else(|| issue.declared_depth())
            .unwrap_or_default();
        let target_paths = issue.target_paths();

        let used_embedded = !issue.checks.is_empty();
        let checks = if used_embedded {
            self.run_embedded_checks(&issue).await
        } else {
            let vars = PatternVariables::for_issue(&issue.id, &issue.lane(), &target_paths);
            let resolved = self.catalog.resolve(issue.pattern_name(), &vars, depth);
            self.run_pattern_checks(&resolved).await
        };

        let mut outcome =
            VerificationOutcome::new(&issue, depth, target_paths, checks, used_embedded);
        outcome.apply_dependency_gate(DependencyGate::new(&self.store).unresolved(issue.depends_on()));

        match self.evidence.write(&outcome) {
            Ok(path) => outcome.evidence_path = Some(path),
            Err(e) => {
                warn!("Failed to save evidence for {}: {}", outcome.issue_id, e);
                outcome.evidence_error = Some(e.to_string());
            }
        }

        if options.update_status && outcome.all_passed {
            let date = outcome.timestamp.date_naive();
            match self
                .store
                .record_verification(&issue.path, outcome.confidence, date)
            {
                Ok(changed) => outcome.status_updated = changed,
                Err(e) => {
                    warn!("Failed to update {}: {}", issue.path.display(), e);
                    outcome.update_error = Some(e.to_string());
                }
            }
        }

        info!(
            "{}: {}/{} checks passed ({}%)",
            outcome.issue_id, outcome.passed_count, outcome.total_checks, outcome.confidence
        );
        VerificationReport::Completed(Box::new(outcome))
    }

    /// Correct, classify and run each embedded check in document order.
    async fn run_embedded_checks(&self, issue: &IssueRecord) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(issue.checks.len());

        for spec in &issue.checks {
            let expectation = match &issue.expected_outputs {
                Some(outputs) => outputs.expectation_for(spec),
                None => CheckExpectation::pass_marker(),
            };

            let correction = auto_correct(&spec.command);
            if correction.was_corrected {
                debug!("Corrected '{}' ({})", spec.command, correction.note);
            }

            let result = match classify(&correction.command) {
                Classification::Malformed { reason } => {
                    debug!("Skipping malformed command '{}': {}", correction.command, reason);
                    CheckResult::malformed(spec, Some(&correction), expectation.exit_code(), &reason)
                }
                Classification::Valid => {
                    self.run_check(spec, Some(&correction), &expectation).await
                }
            };
            results.push(result);
        }

        results
    }

    /// Run pattern checks as written.
    async fn run_pattern_checks(&self, checks: &[ResolvedCheck]) -> Vec<CheckResult> {
        let mut results = Vec::with_capacity(checks.len());

        for check in checks {
            let expectation = CheckExpectation::ExitCode {
                exit_code: check.expected_exit,
                failure_message: check.failure_message.clone(),
            };
            results.push(self.run_check(&check.spec, None, &expectation).await);
        }

        results
    }

    /// Execute the corrected command if there is one, else the check's own.
    async fn run_check(
        &self,
        spec: &CheckSpec,
        correction: Option<&Correction>,
        expectation: &CheckExpectation,
    ) -> CheckResult {
        let command = correction.map_or(spec.command.as_str(), |c| c.command.as_str());

        let started = Instant::now();
        let execution = self.executor.execute(command, self.command_timeout).await;
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        CheckResult::from_execution(spec, correction, expectation, &execution, duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::runner::{CheckExecution, MockCommandExecutor};

    struct Fixture {
        dir: tempfile::TempDir,
        config: VerifierConfig,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("Failed to create temp directory");
            let config = VerifierConfig::new(dir.path());
            Self { dir, config }
        }

        fn issue(&self, id: &str, content: &str) -> &Self {
            let lane = id[..1].to_uppercase();
            let path = self.config.issues_path().join(lane).join(format!("{}.md", id));
            std::fs::create_dir_all(path.parent().expect("issue has a lane dir"))
                .expect("Failed to create lane dir");
            std::fs::write(path, content).expect("Failed to write issue");
            self
        }

        fn root(&self) -> &Path {
            self.dir.path()
        }

        fn verifier(&self, mock: MockCommandExecutor) -> Verifier<MockCommandExecutor> {
            self.verifier_with_catalog(mock, PatternCatalog::default())
        }

        fn verifier_with_catalog(
            &self,
            mock: MockCommandExecutor,
            catalog: PatternCatalog,
        ) -> Verifier<MockCommandExecutor> {
            Verifier::with_executor(&self.config, Arc::new(catalog), mock)
        }
    }

    fn pass() -> CheckExecution {
        CheckExecution::Completed {
            exit_code: 0,
            output: "PASS\n".to_string(),
        }
    }

    fn embedded_issue(status: &str, command: &str) -> String {
        format!(
            "---\nissue_id: G-01\nstatus: {}\n---\n# G-01\n\n**Verification Commands**\n\n```bash\n# Check 1: The check\n{}\n```\n",
            status, command
        )
    }

    fn completed(report: VerificationReport) -> VerificationOutcome {
        match report {
            VerificationReport::Completed(outcome) => *outcome,
            VerificationReport::Errored { error, .. } => panic!("unexpected error: {}", error),
        }
    }

    #[tokio::test]
    async fn test_embedded_command_is_corrected_before_execution() {
        let fixture = Fixture::new();
        fixture.issue("G-01", &embedded_issue("RESOLVED", "test -f config/ && echo PASS"));

        let mut mock = MockCommandExecutor::new();
        mock.expect_execute()
            .withf(|command, _| command == "test -d config/ && echo PASS")
            .times(1)
            .returning(|_, _| pass());

        let outcome = completed(
            fixture
                .verifier(mock)
                .verify_issue("G-01", VerifyOptions::default())
                .await,
        );

        assert!(outcome.all_passed);
        assert!(outcome.used_embedded_commands);
        assert!(outcome.checks[0].was_auto_corrected);
        assert_eq!(outcome.checks[0].command, "test -f config/ && echo PASS");
        assert!(outcome.evidence_path.is_some());
    }

    #[tokio::test]
    async fn test_malformed_command_never_executes() {
        let fixture = Fixture::new();
        fixture.issue(
            "G-01",
            &embedded_issue("RESOLVED", "test -f <brick-id>.md && echo PASS"),
        );

        let mut mock = MockCommandExecutor::new();
        mock.expect_execute().times(0);

        let outcome = completed(
            fixture
                .verifier(mock)
                .verify_issue("G-01", VerifyOptions::default())
                .await,
        );

        assert!(!outcome.all_passed);
        assert!(outcome.checks[0].malformed);
        assert_eq!(outcome.checks[0].actual_exit, -2);
    }

    #[tokio::test]
    async fn test_expected_outputs_drive_pass_rule() {
        let fixture = Fixture::new();
        let content = format!(
            "{}\n**Expected Outputs**\n\n```yaml\nexpected_results:\n  check_1:\n    exit_code: 1\n    stdout_contains: absent\n```\n",
            embedded_issue("OPEN", "grep -q secret .env || echo absent")
        );
        fixture.issue("G-01", &content);

        let mut mock = MockCommandExecutor::new();
        mock.expect_execute().times(1).returning(|_, _| CheckExecution::Completed {
            exit_code: 1,
            output: "absent\n".to_string(),
        });

        let outcome = completed(
            fixture
                .verifier(mock)
                .verify_issue("G-01", VerifyOptions::default())
                .await,
        );

        assert!(outcome.all_passed);
        assert_eq!(outcome.checks[0].expected_exit, 1);
    }

    #[tokio::test]
    async fn test_pattern_checks_use_requested_depth() {
        let fixture = Fixture::new();
        fixture.issue(
            "G-02",
            "---\nstatus: RESOLVED\nverification_pattern: missing_doc\nverification_depth: DEEP\naffected_paths: [docs/guide.md]\n---\nbody\n",
        );
        let catalog = PatternCatalog::from_yaml(
            "patterns:\n  missing_doc:\n    checks:\n      - name: doc_exists\n        command: test -f {file_path}\n      - name: has_title\n        command: grep -q Title {file_path}\ndepth_levels:\n  QUICK:\n    checks: [existence]\n",
        )
        .expect("catalog should parse");

        let mut mock = MockCommandExecutor::new();
        mock.expect_execute()
            .withf(|command, _| command == "test -f docs/guide.md")
            .times(1)
            .returning(|_, _| CheckExecution::Completed {
                exit_code: 0,
                output: String::new(),
            });

        let options = VerifyOptions {
            depth: Some(Depth::Quick),
            update_status: false,
        };
        let outcome = completed(
            fixture
                .verifier_with_catalog(mock, catalog)
                .verify_issue("G-02", options)
                .await,
        );

        assert_eq!(outcome.depth, Depth::Quick);
        assert_eq!(outcome.total_checks, 1);
        assert!(outcome.all_passed);
        assert!(!outcome.used_embedded_commands);
        assert_eq!(outcome.pattern, "missing_doc");
    }

    #[tokio::test]
    async fn test_unknown_pattern_yields_no_checks() {
        let fixture = Fixture::new();
        fixture.issue("G-03", "---\nstatus: RESOLVED\nverification_pattern: nope\n---\n");

        let mut mock = MockCommandExecutor::new();
        mock.expect_execute().times(0);

        let outcome = completed(
            fixture
                .verifier(mock)
                .verify_issue("G-03", VerifyOptions::default())
                .await,
        );

        assert_eq!(outcome.total_checks, 0);
        assert_eq!(outcome.confidence, 0);
        assert!(!outcome.all_passed);
    }

    #[tokio::test]
    async fn test_open_dependency_appends_failure_after_checks_run() {
        let fixture = Fixture::new();
        fixture
            .issue("G-00", "---\nstatus: OPEN\n---\n")
            .issue(
                "G-01",
                &embedded_issue("RESOLVED", "test -f a.txt && echo PASS")
                    .replace("status: RESOLVED", "status: RESOLVED\ndepends_on: [G-00]"),
            );

        let mut mock = MockCommandExecutor::new();
        mock.expect_execute().times(1).returning(|_, _| pass());

        let outcome = completed(
            fixture
                .verifier(mock)
                .verify_issue("G-01", VerifyOptions::default())
                .await,
        );

        assert_eq!(outcome.unresolved_dependencies, vec!["G-00"]);
        assert_eq!(outcome.passed_count, 1);
        assert_eq!(outcome.failed_count, 1);
        assert!(!outcome.all_passed);
        assert_eq!(outcome.checks[1].name, "dependency_check");
    }

    #[tokio::test]
    async fn test_missing_issue_is_errored() {
        let fixture = Fixture::new();
        let mock = MockCommandExecutor::new();

        let report = fixture
            .verifier(mock)
            .verify_issue("G-99", VerifyOptions::default())
            .await;

        assert!(matches!(report, VerificationReport::Errored { .. }));
        assert!(!report.passed());
    }

    #[tokio::test]
    async fn test_update_status_on_success() {
        let fixture = Fixture::new();
        fixture.issue("G-01", &embedded_issue("RESOLVED", "test -f a.txt && echo PASS"));

        let mut mock = MockCommandExecutor::new();
        mock.expect_execute().returning(|_, _| pass());

        let options = VerifyOptions {
            depth: None,
            update_status: true,
        };
        let outcome = completed(fixture.verifier(mock).verify_issue("G-01", options).await);

        assert!(outcome.status_updated);
        let content = std::fs::read_to_string(fixture.root().join("issues/G/G-01.md"))
            .expect("Failed to read issue");
        assert!(content.contains("date_verified: \""));
        assert!(content.contains("verification_confidence: 100"));
    }

    #[tokio::test]
    async fn test_no_update_when_checks_fail() {
        let fixture = Fixture::new();
        let original = embedded_issue("RESOLVED", "test -f a.txt && echo PASS");
        fixture.issue("G-01", &original);

        let mut mock = MockCommandExecutor::new();
        mock.expect_execute().returning(|_, _| CheckExecution::Completed {
            exit_code: 1,
            output: String::new(),
        });

        let options = VerifyOptions {
            depth: None,
            update_status: true,
        };
        let outcome = completed(fixture.verifier(mock).verify_issue("G-01", options).await);

        assert!(!outcome.status_updated);
        let content = std::fs::read_to_string(fixture.root().join("issues/G/G-01.md"))
            .expect("Failed to read issue");
        assert_eq!(content, original);
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn test_evidence_failure_is_recorded_not_fatal() {
        let fixture = Fixture::new();
        fixture.issue("G-01", &embedded_issue("RESOLVED", "test -f a.txt && echo PASS"));
        // A file where the evidence directory should be.
        let evidence = fixture.config.evidence_path();
        std::fs::create_dir_all(evidence.parent().expect("evidence dir has a parent"))
            .expect("Failed to create parent");
        std::fs::write(&evidence, "not a directory").expect("Failed to write blocker");

        let mut mock = MockCommandExecutor::new();
        mock.expect_execute().returning(|_, _| pass());

        let outcome = completed(
            fixture
                .verifier(mock)
                .verify_issue("G-01", VerifyOptions::default())
                .await,
        );

        assert!(outcome.all_passed);
        assert!(outcome.evidence_path.is_none());
        assert!(outcome.evidence_error.is_some());
    }
}
