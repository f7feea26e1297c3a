//! Extraction of verification sections from an issue body.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::verification::{CheckExpectation, CheckSpec, PASS_MARKER};

/// Maximum number of target paths collected per issue.
pub const MAX_TARGET_PATHS: usize = 5;

static VERIFICATION_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ms)^[ \t]*(?:[-*+][ \t]+)?(?:#{1,6}[ \t]*)?(?:\*\*)?Verification Commands[^\n]*\n.*?^[ \t]*```(?:bash|sh|shell)?[ \t]*\n(.*?)^[ \t]*```",
    )
    .expect("Invalid regex")
});

static CHECK_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*#[ \t]*(Check[ \t]+\d+):[ \t]*([^\n]+)\n[ \t]*([^\n]+)")
        .expect("Invalid regex")
});

static EXPECTED_OUTPUTS_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ms)^[ \t]*(?:[-*+][ \t]+)?(?:#{1,6}[ \t]*)?(?:\*\*)?Expected Outputs[^\n]*\n.*?^[ \t]*```(?:yaml|yml)[ \t]*\n(.*?)^[ \t]*```",
    )
    .expect("Invalid regex")
});

static LINE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\d+.*$").expect("Invalid regex"));

static REFERENCED_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Referenced[ \t]+path:[ \t]*`?([^\s`]+)`?").expect("Invalid regex")
});

static BACKTICKED_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"`([^`\s]+\.(?:py|yaml|yml|json|md|sh))`").expect("Invalid regex")
});

/// Machine-readable expectations for embedded checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExpectedOutputs {
    #[serde(default)]
    pub expected_results: HashMap<String, ExpectedResult>,
}

/// Expectation for one embedded check.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExpectedResult {
    #[serde(default)]
    pub exit_code: i32,
    #[serde(default = "default_marker")]
    pub stdout_contains: String,
}

fn default_marker() -> String {
    PASS_MARKER.to_string()
}

impl Default for ExpectedResult {
    fn default() -> Self {
        Self {
            exit_code: 0,
            stdout_contains: default_marker(),
        }
    }
}

impl ExpectedOutputs {
    /// Expectation for `spec`, defaulting to exit 0 and `PASS`.
    pub fn expectation_for(&self, spec: &CheckSpec) -> CheckExpectation {
        let result = spec
            .expected_key()
            .and_then(|key| self.expected_results.get(&key))
            .cloned()
            .unwrap_or_default();

        CheckExpectation::Output {
            exit_code: result.exit_code,
            stdout_contains: result.stdout_contains,
        }
    }
}

/// Checks listed in the body's "Verification Commands" block.
pub fn extract_verification_commands(body: &str) -> Vec<CheckSpec> {
    let Some(block) = VERIFICATION_BLOCK.captures(body).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    CHECK_ENTRY
        .captures_iter(block.as_str())
        .map(|caps| CheckSpec {
            label: Some(caps[1].split_whitespace().collect::<Vec<_>>().join(" ")),
            name: caps[2].trim().to_string(),
            command: caps[3].trim().to_string(),
        })
        .collect()
}

/// Expected outputs from the body's "Expected Outputs" YAML block.
///
/// A block that fails to parse is ignored with a warning.
pub fn extract_expected_outputs(body: &str) -> Option<ExpectedOutputs> {
    let block = EXPECTED_OUTPUTS_BLOCK.captures(body)?.get(1)?;

    match serde_yaml::from_str::<ExpectedOutputs>(block.as_str()) {
        Ok(outputs) => Some(outputs),
        Err(e) => {
            warn!("Ignoring unparseable expected outputs block: {}", e);
            None
        }
    }
}

/// Paths an issue points at, from frontmatter and body references.
pub fn extract_target_paths(affected_paths: &[String], body: &str) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    for path in affected_paths {
        let clean = LINE_SUFFIX.replace(path, "").replace('`', "");
        let clean = clean.trim();
        if clean.contains('/') && !clean.starts_with("test") {
            candidates.push(clean.to_string());
        }
    }

    candidates.extend(
        REFERENCED_PATH
            .captures_iter(body)
            .map(|caps| caps[1].to_string()),
    );

    candidates.extend(
        BACKTICKED_PATH
            .captures_iter(body)
            .map(|caps| caps[1].to_string())
            .filter(|p| p.contains('/')),
    );

    let mut paths: Vec<String> = Vec::new();
    for candidate in candidates {
        let path = LINE_SUFFIX.replace(candidate.trim(), "").into_owned();
        if path.len() > 3 && path.contains('/') && !paths.contains(&path) {
            paths.push(path);
        }
        if paths.len() == MAX_TARGET_PATHS {
            break;
        }
    }
    paths
}
