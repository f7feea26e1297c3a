//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use vouch::VerifierConfig;

/// A throwaway repository with issue records, a catalog and files to check.
pub struct TestWorkspace {
    pub dir: tempfile::TempDir,
}

impl TestWorkspace {
    /// Create an empty workspace in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Config rooted at the workspace with default relative paths.
    pub fn config(&self) -> VerifierConfig {
        VerifierConfig::new(self.root())
    }

    /// Write a file relative to the root, creating parent directories.
    pub fn file(&self, rel: &str, content: &str) -> &Self {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        self
    }

    /// Create a directory relative to the root.
    pub fn dir(&self, rel: &str) -> &Self {
        fs::create_dir_all(self.root().join(rel)).expect("Failed to create directory");
        self
    }

    /// Write an issue record under `issues/<LANE>/<id>.md`.
    pub fn issue(&self, id: &str, content: &str) -> &Self {
        let lane = id[..1].to_uppercase();
        self.file(&format!("issues/{}/{}.md", lane, id), content)
    }

    /// Write the pattern catalog at its default location.
    pub fn catalog(&self, yaml: &str) -> &Self {
        self.file("tools/verification_patterns.yaml", yaml)
    }

    pub fn issue_path(&self, id: &str) -> PathBuf {
        let lane = id[..1].to_uppercase();
        self.root().join(format!("issues/{}/{}.md", lane, id))
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.root().join(rel))
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", rel, e))
    }

    /// Evidence files written for a lane, sorted.
    pub fn evidence_files(&self, lane: &str) -> Vec<PathBuf> {
        let dir = self.root().join("LogBook/verification/evidence").join(lane);
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();
        files
    }
}

/// Build an issue record with embedded verification commands.
///
/// `checks` are `(name, command)` pairs numbered from 1.
pub fn issue_with_checks(status: &str, extra_frontmatter: &str, checks: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (i, (name, command)) in checks.iter().enumerate() {
        body.push_str(&format!("# Check {}: {}\n{}\n\n", i + 1, name, command));
    }

    format!(
        "---\nstatus: {}\n{}---\n# Issue\n\n**Verification Commands:**\n\n```bash\n{}```\n",
        status, extra_frontmatter, body
    )
}

/// Build an issue record that relies on a catalog pattern.
pub fn issue_with_pattern(status: &str, pattern: &str, affected: &str) -> String {
    format!(
        "---\nstatus: {}\nverification_pattern: {}\naffected_paths:\n  - {}\n---\n# Issue\n",
        status, pattern, affected
    )
}

/// A small catalog with one file pattern.
pub const CATALOG: &str = r#"
patterns:
  missing_file:
    description: A file that should exist
    checks:
      - name: file_exists
        command: test -f {file_path}
        failure_message: File does not exist
      - name: file_not_empty
        command: test -s {file_path}
        failure_message: File is empty
depth_levels:
  QUICK:
    checks: [existence]
  STANDARD:
    checks: [existence, content_validation]
"#;
