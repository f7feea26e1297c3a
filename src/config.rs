//! Verifier configuration.
//!
//! Defaults, overridden by the environment, overridden by CLI flags.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

/// Issue records, relative to the repository root.
pub const DEFAULT_ISSUES_DIR: &str = "issues";

/// Pattern catalog, relative to the repository root.
pub const DEFAULT_PATTERNS_FILE: &str = "tools/verification_patterns.yaml";

/// Evidence output, relative to the repository root.
pub const DEFAULT_EVIDENCE_DIR: &str = "LogBook/verification/evidence";

/// Default per-command timeout (30 seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default number of issues verified concurrently.
pub const DEFAULT_JOBS: usize = 4;

/// Environment variable to override the default command timeout.
pub const TIMEOUT_ENV_VAR: &str = "VOUCH_COMMAND_TIMEOUT";

/// Where the verifier reads from and writes to, and how it runs commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Repository root. Checks run here and relative paths resolve against it.
    pub root: PathBuf,
    pub issues_dir: PathBuf,
    pub patterns_file: PathBuf,
    pub evidence_dir: PathBuf,
    pub command_timeout: Duration,
    pub jobs: usize,
}

impl VerifierConfig {
    /// Defaults rooted at `root`, with the timeout taken from the environment.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            issues_dir: PathBuf::from(DEFAULT_ISSUES_DIR),
            patterns_file: PathBuf::from(DEFAULT_PATTERNS_FILE),
            evidence_dir: PathBuf::from(DEFAULT_EVIDENCE_DIR),
            command_timeout: get_timeout(),
            jobs: DEFAULT_JOBS,
        }
    }

    pub fn with_issues_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.issues_dir = dir.into();
        self
    }

    pub fn with_patterns_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.patterns_file = file.into();
        self
    }

    pub fn with_evidence_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.evidence_dir = dir.into();
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the concurrency limit. Zero is treated as one.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn issues_path(&self) -> PathBuf {
        self.resolve(&self.issues_dir)
    }

    pub fn patterns_path(&self) -> PathBuf {
        self.resolve(&self.patterns_file)
    }

    pub fn evidence_path(&self) -> PathBuf {
        self.resolve(&self.evidence_dir)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Get the configured command timeout.
///
/// Reads from VOUCH_COMMAND_TIMEOUT if set, otherwise uses the default
/// of 30 seconds. Logs a warning if the variable is set but invalid.
pub fn get_timeout() -> Duration {
    match env::var(TIMEOUT_ENV_VAR) {
        Ok(v) if !v.is_empty() => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    TIMEOUT_ENV_VAR, v, DEFAULT_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_TIMEOUT_SECS)
            }
        },
        _ => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
}
