//! File-based issue store.
//!
//! Issues live at `<issues_dir>/<LANE>/<ID>.md`. The store locates them,
//! lists lanes, and records successful verifications in the frontmatter.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{IssueError, StatusUpdateError};

use super::record::{IssueRecord, lane_of, locate_frontmatter};

/// Files in a lane directory that are not issues.
const TEMPLATE_MARKER: &str = "TEMPLATE";

/// Read access to issue files plus the frontmatter status update.
#[derive(Debug, Clone)]
pub struct IssueStore {
    root: PathBuf,
}

impl IssueStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Find the file for an issue identifier.
    ///
    /// Tries `<LANE>/<id>.md`, then `<LANE>/<LANE>-<rest>.md`, then the first
    /// file in the lane whose name contains the identifier.
    pub fn locate(&self, issue_id: &str) -> Result<PathBuf, IssueError> {
        let id = issue_id.trim();
        if !id.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
            return Err(IssueError::InvalidId(issue_id.to_string()));
        }

        let lane = lane_of(id);
        let lane_dir = self.root.join(&lane);

        let exact = lane_dir.join(format!("{}.md", id));
        if exact.is_file() {
            return Ok(exact);
        }

        let rest = id[1..].trim_start_matches('-');
        let normalized = lane_dir.join(format!("{}-{}.md", lane, rest));
        if normalized.is_file() {
            return Ok(normalized);
        }

        let pattern = format!(
            "{}/*{}*.md",
            glob::Pattern::escape(&lane_dir.to_string_lossy()),
            glob::Pattern::escape(id)
        );
        if let Ok(entries) = glob::glob(&pattern) {
            let mut matches: Vec<PathBuf> = entries.filter_map(Result::ok).collect();
            matches.sort();
            if let Some(first) = matches.into_iter().next() {
                debug!("Resolved {} by name match to {}", id, first.display());
                return Ok(first);
            }
        }

        Err(IssueError::NotFound(issue_id.to_string()))
    }

    /// Locate and parse an issue.
    pub fn load(&self, issue_id: &str) -> Result<IssueRecord, IssueError> {
        let path = self.locate(issue_id)?;
        let content = std::fs::read_to_string(&path).map_err(|source| IssueError::ReadFailed {
            path: path.clone(),
            source,
        })?;
        IssueRecord::parse(issue_id.trim(), &path, &content)
    }

    /// Lane directories under the root, sorted.
    pub fn lanes(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Vec::new();
        };

        let mut lanes: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|e| e.path().is_dir())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| !name.starts_with('.'))
            .collect();
        lanes.sort();
        lanes
    }

    /// Identifiers of every issue in a lane, sorted, skipping templates.
    pub fn lane_issue_ids(&self, lane: &str) -> Vec<String> {
        let lane_dir = self.root.join(lane.to_uppercase());
        let pattern = format!("{}/*.md", glob::Pattern::escape(&lane_dir.to_string_lossy()));

        let Ok(entries) = glob::glob(&pattern) else {
            return Vec::new();
        };

        let mut ids: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .filter(|stem| !stem.contains(TEMPLATE_MARKER))
            .collect();
        ids.sort();
        ids
    }

    /// Record a successful verification in an issue's frontmatter.
    ///
    /// Adds `date_verified` and `verification_confidence` unless the record
    /// already carries a `date_verified`. Returns whether the file changed.
    pub fn record_verification(
        &self,
        path: &Path,
        confidence: u32,
        date: NaiveDate,
    ) -> Result<bool, StatusUpdateError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| StatusUpdateError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;

        let span = locate_frontmatter(&content)
            .map_err(|_| StatusUpdateError::MissingFrontmatter(path.to_path_buf()))?;

        let already_verified = content[span.yaml.clone()]
            .lines()
            .any(|line| line.starts_with("date_verified:"));
        if already_verified {
            debug!("{} already has date_verified, leaving it untouched", path.display());
            return Ok(false);
        }

        let mut updated = String::with_capacity(content.len() + 64);
        updated.push_str(&content[..span.yaml.end]);
        updated.push_str(&format!(
            "date_verified: \"{}\"\nverification_confidence: {}\n",
            date.format("%Y-%m-%d"),
            confidence
        ));
        updated.push_str(&content[span.yaml.end..]);

        write_atomically(path, &updated).map_err(|source| StatusUpdateError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(true)
    }
}

/// Replace a file's contents through a temp file in the same directory.
fn write_atomically(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(files: &[(&str, &str)]) -> (tempfile::TempDir, IssueStore) {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        for (rel, content) in files {
            let path = dir.path().join(rel);
            std::fs::create_dir_all(path.parent().expect("file has a parent"))
                .expect("Failed to create lane dir");
            std::fs::write(&path, content).expect("Failed to write issue");
        }
        let store = IssueStore::new(dir.path());
        (dir, store)
    }

    const OPEN: &str = "---\nissue_id: G-01\nstatus: OPEN\n---\n# Body\n";

    #[test]
    fn test_locate_exact() {
        let (dir, store) = store_with(&[("G/G-01.md", OPEN)]);

        let path = store.locate("G-01").expect("issue should be found");

        assert_eq!(path, dir.path().join("G/G-01.md"));
    }

    #[test]
    fn test_locate_normalizes_lowercase_lane() {
        let (dir, store) = store_with(&[("G/G-01.md", OPEN)]);

        let path = store.locate("g-01").expect("issue should be found");

        assert_eq!(path, dir.path().join("G/G-01.md"));
    }

    #[test]
    fn test_locate_by_name_match() {
        let (dir, store) = store_with(&[("G/G-01_config_missing.md", OPEN)]);

        let path = store.locate("G-01").expect("issue should be found");

        assert_eq!(path, dir.path().join("G/G-01_config_missing.md"));
    }

    #[test]
    fn test_locate_not_found() {
        let (_dir, store) = store_with(&[("G/G-01.md", OPEN)]);

        assert!(matches!(store.locate("G-99"), Err(IssueError::NotFound(_))));
        assert!(matches!(store.locate("B-01"), Err(IssueError::NotFound(_))));
    }

    #[test]
    fn test_locate_invalid_id() {
        let (_dir, store) = store_with(&[]);

        assert!(matches!(store.locate(""), Err(IssueError::InvalidId(_))));
        assert!(matches!(store.locate("01"), Err(IssueError::InvalidId(_))));
    }

    #[test]
    fn test_lane_issue_ids_skip_templates() {
        let (_dir, store) = store_with(&[
            ("G/G-02.md", OPEN),
            ("G/G-01.md", OPEN),
            ("G/G-TEMPLATE.md", OPEN),
            ("G/notes.txt", "not an issue"),
        ]);

        assert_eq!(store.lane_issue_ids("g"), vec!["G-01", "G-02"]);
        assert!(store.lane_issue_ids("Z").is_empty());
    }

    #[test]
    fn test_lanes_sorted() {
        let (_dir, store) = store_with(&[("G/G-01.md", OPEN), ("B/B-01.md", OPEN)]);
        assert_eq!(store.lanes(), vec!["B", "G"]);
    }

    #[test]
    fn test_record_verification_inserts_fields() {
        let (dir, store) = store_with(&[("G/G-01.md", OPEN)]);
        let path = dir.path().join("G/G-01.md");
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date");

        let changed = store
            .record_verification(&path, 100, date)
            .expect("update should succeed");

        assert!(changed);
        let content = std::fs::read_to_string(&path).expect("Failed to read issue");
        assert_eq!(
            content,
            "---\nissue_id: G-01\nstatus: OPEN\ndate_verified: \"2026-03-14\"\nverification_confidence: 100\n---\n# Body\n"
        );
    }

    #[test]
    fn test_record_verification_keeps_existing_date() {
        let original = "---\nstatus: RESOLVED\ndate_verified: \"2025-01-01\"\n---\nbody\n";
        let (dir, store) = store_with(&[("G/G-01.md", original)]);
        let path = dir.path().join("G/G-01.md");
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date");

        let changed = store
            .record_verification(&path, 50, date)
            .expect("update should succeed");

        assert!(!changed);
        let content = std::fs::read_to_string(&path).expect("Failed to read issue");
        assert_eq!(content, original);
    }

    #[test]
    fn test_record_verification_requires_frontmatter() {
        let (dir, store) = store_with(&[("G/G-01.md", "no frontmatter\n")]);
        let path = dir.path().join("G/G-01.md");
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).expect("valid date");

        let result = store.record_verification(&path, 100, date);

        assert!(matches!(result, Err(StatusUpdateError::MissingFrontmatter(_))));
    }
}
