//! Issue record parsing.

use std::ops::Range;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::error::IssueError;
use crate::pattern::{DEFAULT_PATTERN, Depth};
use crate::verification::CheckSpec;

use super::sections::{self, ExpectedOutputs};

/// Frontmatter fields the verifier reads.
///
/// Scalars of any YAML type are accepted and stringified.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFrontmatter {
    #[serde(default, deserialize_with = "scalar")]
    pub issue_id: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub lane: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub verification_pattern: Option<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub verification_depth: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub depends_on: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub affected_paths: Vec<String>,
    #[serde(default, deserialize_with = "scalar")]
    pub date_verified: Option<String>,
}

/// A parsed issue file.
#[derive(Debug, Clone)]
pub struct IssueRecord {
    /// Identifier the record was requested by.
    pub id: String,
    pub path: PathBuf,
    pub frontmatter: IssueFrontmatter,
    /// Everything after the closing frontmatter delimiter.
    pub body: String,
    /// Checks embedded in the body, in document order.
    pub checks: Vec<CheckSpec>,
    pub expected_outputs: Option<ExpectedOutputs>,
}

impl IssueRecord {
    /// Parse an issue file's contents.
    pub fn parse(id: &str, path: &Path, content: &str) -> Result<Self, IssueError> {
        let span = locate_frontmatter(content).map_err(|e| match e {
            FrontmatterMissing::NoOpening => IssueError::MissingFrontmatter(path.to_path_buf()),
            FrontmatterMissing::NoClosing => IssueError::UnclosedFrontmatter(path.to_path_buf()),
        })?;

        let yaml = &content[span.yaml.clone()];
        if yaml.trim().is_empty() {
            return Err(IssueError::MissingFrontmatter(path.to_path_buf()));
        }

        let frontmatter: IssueFrontmatter =
            serde_yaml::from_str(yaml).map_err(|source| IssueError::InvalidFrontmatter {
                path: path.to_path_buf(),
                source,
            })?;

        let body = content[span.body_start..].to_string();
        let checks = sections::extract_verification_commands(&body);
        let expected_outputs = sections::extract_expected_outputs(&body);

        Ok(Self {
            id: id.to_string(),
            path: path.to_path_buf(),
            frontmatter,
            body,
            checks,
            expected_outputs,
        })
    }

    /// Lane letter, from the frontmatter or the identifier's first character.
    pub fn lane(&self) -> String {
        self.frontmatter
            .lane
            .clone()
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| lane_of(&self.id))
    }

    pub fn status(&self) -> Option<&str> {
        self.frontmatter.status.as_deref()
    }

    /// Whether the record's status is `RESOLVED` (case-insensitive).
    pub fn is_resolved(&self) -> bool {
        self.status()
            .is_some_and(|s| s.trim().eq_ignore_ascii_case("RESOLVED"))
    }

    /// Pattern to resolve when the body has no embedded checks.
    pub fn pattern_name(&self) -> &str {
        self.frontmatter
            .verification_pattern
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PATTERN)
    }

    /// Declared depth, ignoring values that are not a known tier.
    pub fn declared_depth(&self) -> Option<Depth> {
        self.frontmatter
            .verification_depth
            .as_deref()
            .and_then(|d| d.parse().ok())
    }

    pub fn depends_on(&self) -> &[String] {
        &self.frontmatter.depends_on
    }

    /// Paths the fix touched, used for pattern variables.
    pub fn target_paths(&self) -> Vec<String> {
        sections::extract_target_paths(&self.frontmatter.affected_paths, &self.body)
    }
}

/// Uppercased first character of an identifier.
pub fn lane_of(id: &str) -> String {
    id.chars()
        .next()
        .map(|c| c.to_ascii_uppercase().to_string())
        .unwrap_or_default()
}

/// Byte ranges of a frontmatter block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FrontmatterSpan {
    /// The YAML between the delimiters, ending at the start of the closing line.
    pub yaml: Range<usize>,
    /// First byte after the closing delimiter line.
    pub body_start: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrontmatterMissing {
    NoOpening,
    NoClosing,
}

/// Find the `---` delimited block at the top of a document.
pub(crate) fn locate_frontmatter(content: &str) -> Result<FrontmatterSpan, FrontmatterMissing> {
    let mut lines = content.split_inclusive('\n');

    let first = lines.next().ok_or(FrontmatterMissing::NoOpening)?;
    if first.trim_end() != "---" {
        return Err(FrontmatterMissing::NoOpening);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == "---" {
            return Ok(FrontmatterSpan {
                yaml: yaml_start..offset,
                body_start: offset + line.len(),
            });
        }
        offset += line.len();
    }

    Err(FrontmatterMissing::NoClosing)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value))
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
        other => scalar_to_string(&other).into_iter().collect(),
    })
}
