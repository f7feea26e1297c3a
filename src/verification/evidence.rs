//! Evidence files for verification runs.
//!
//! Every run of every issue leaves one JSON file under
//! `<evidence_dir>/<LANE>/`. Files are never overwritten.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::EvidenceError;
use crate::issue::lane_of;

use super::check::CheckResult;
use super::outcome::VerificationOutcome;

/// Suffixes tried when two runs of an issue land in the same second.
const MAX_COLLISION_SUFFIX: u32 = 999;

/// Persisted record of one verification run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub issue_id: String,
    pub lane: String,
    /// RFC 3339 local time of the run.
    pub timestamp: String,
    pub all_passed: bool,
    pub passed_checks: usize,
    pub failed_checks: usize,
    pub total_checks: usize,
    pub confidence_score: u32,
    pub verification_pattern: String,
    pub verification_depth: String,
    pub affected_paths: Vec<String>,
    pub depends_on: Vec<String>,
    pub unresolved_dependencies: Vec<String>,
    pub used_embedded_commands: bool,
    pub checks: Vec<CheckResult>,
}

impl EvidenceRecord {
    pub fn from_outcome(outcome: &VerificationOutcome) -> Self {
        Self {
            issue_id: outcome.issue_id.clone(),
            lane: outcome.lane.clone(),
            timestamp: outcome.timestamp.to_rfc3339(),
            all_passed: outcome.all_passed,
            passed_checks: outcome.passed_count,
            failed_checks: outcome.failed_count,
            total_checks: outcome.total_checks,
            confidence_score: outcome.confidence,
            verification_pattern: outcome.pattern.clone(),
            verification_depth: outcome.depth.to_string(),
            affected_paths: outcome.target_paths.clone(),
            depends_on: outcome.depends_on.clone(),
            unresolved_dependencies: outcome.unresolved_dependencies.clone(),
            used_embedded_commands: outcome.used_embedded_commands,
            checks: outcome.checks.clone(),
        }
    }
}

/// Append-only store of evidence files.
#[derive(Debug, Clone)]
pub struct EvidenceStore {
    root: PathBuf,
}

impl EvidenceStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn lane_dir(&self, lane: &str, issue_id: &str) -> PathBuf {
        let lane = if lane.is_empty() {
            lane_of(issue_id)
        } else {
            lane.to_uppercase()
        };
        self.root.join(lane)
    }

    /// Write the evidence for an outcome and return the file's path.
    ///
    /// The file is written to a temp file first and then persisted under
    /// `<ID>_<YYYYmmdd_HHMMSS>.json` without clobbering; a name already in
    /// use gets a numeric suffix.
    pub fn write(&self, outcome: &VerificationOutcome) -> Result<PathBuf, EvidenceError> {
        let lane_dir = self.lane_dir(&outcome.lane, &outcome.issue_id);
        std::fs::create_dir_all(&lane_dir).map_err(|source| EvidenceError::CreateDirFailed {
            path: lane_dir.clone(),
            source,
        })?;

        let record = EvidenceRecord::from_outcome(outcome);
        let json = serde_json::to_string_pretty(&record).map_err(EvidenceError::SerializeFailed)?;

        let mut temp = NamedTempFile::new_in(&lane_dir).map_err(EvidenceError::WriteFailed)?;
        temp.write_all(json.as_bytes())
            .map_err(EvidenceError::WriteFailed)?;
        temp.as_file().sync_all().map_err(EvidenceError::WriteFailed)?;

        let stem = format!(
            "{}_{}",
            outcome.issue_id,
            outcome.timestamp.format("%Y%m%d_%H%M%S")
        );

        let mut attempt = 0;
        loop {
            let name = if attempt == 0 {
                format!("{}.json", stem)
            } else {
                format!("{}_{}.json", stem, attempt)
            };
            let path = lane_dir.join(name);

            match temp.persist_noclobber(&path) {
                Ok(_) => {
                    debug!("Wrote evidence to {}", path.display());
                    return Ok(path);
                }
                Err(e)
                    if e.error.kind() == std::io::ErrorKind::AlreadyExists
                        && attempt < MAX_COLLISION_SUFFIX =>
                {
                    temp = e.file;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(EvidenceError::PersistFailed {
                        path,
                        source: e.error,
                    });
                }
            }
        }
    }

    /// Read a previously written evidence file.
    pub fn read(path: &Path) -> Result<EvidenceRecord, EvidenceError> {
        let content = std::fs::read_to_string(path).map_err(|source| EvidenceError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| EvidenceError::InvalidRecord {
            path: path.to_path_buf(),
            source,
        })
    }
}
