//! Check specifications and per-check results.

use serde::{Deserialize, Serialize};

use crate::command::Correction;
use crate::runner::{CheckExecution, EXIT_MALFORMED};

/// Maximum number of characters of command output kept in a result.
pub const MAX_OUTPUT_CHARS: usize = 500;

/// Marker an embedded check must print when no expected outputs are declared.
pub const PASS_MARKER: &str = "PASS";

/// A single check to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckSpec {
    /// Ordinal label (`Check 1`) for embedded checks, `None` for pattern checks.
    pub label: Option<String>,
    pub name: String,
    pub command: String,
}

impl CheckSpec {
    /// Key of this check in an `expected_results` mapping (`check_1`).
    pub fn expected_key(&self) -> Option<String> {
        let label = self.label.as_deref()?;
        let digits: String = label.chars().filter(|c| c.is_ascii_digit()).collect();
        (!digits.is_empty()).then(|| format!("check_{}", digits))
    }
}

/// How a check's execution is judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckExpectation {
    /// Exit code must match and the output must contain a marker.
    Output {
        exit_code: i32,
        stdout_contains: String,
    },
    /// Exit code must match. The failure message is reported when it doesn't.
    ExitCode {
        exit_code: i32,
        failure_message: Option<String>,
    },
}

impl CheckExpectation {
    /// Default expectation for embedded checks: exit 0 and print `PASS`.
    pub fn pass_marker() -> Self {
        CheckExpectation::Output {
            exit_code: 0,
            stdout_contains: PASS_MARKER.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CheckExpectation::Output { exit_code, .. } => *exit_code,
            CheckExpectation::ExitCode { exit_code, .. } => *exit_code,
        }
    }

    pub fn is_met(&self, actual_exit: i32, output: &str) -> bool {
        match self {
            CheckExpectation::Output {
                exit_code,
                stdout_contains,
            } => actual_exit == *exit_code && output.contains(stdout_contains.as_str()),
            CheckExpectation::ExitCode { exit_code, .. } => actual_exit == *exit_code,
        }
    }

    fn failure_message(&self) -> &str {
        match self {
            CheckExpectation::ExitCode {
                failure_message: Some(message),
                ..
            } => message.as_str(),
            _ => "Check failed",
        }
    }
}

/// Result of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    /// The command as written in the issue record or pattern.
    pub command: String,
    /// The command actually run, when correction changed it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correction_note: Option<String>,
    pub expected_exit: i32,
    pub actual_exit: i32,
    /// Combined stdout and stderr, truncated.
    pub output: String,
    pub passed: bool,
    pub duration_ms: u64,
    pub error_message: String,
    #[serde(default)]
    pub malformed: bool,
    #[serde(default)]
    pub was_auto_corrected: bool,
}

impl CheckResult {
    /// Build the result of an executed check.
    pub fn from_execution(
        spec: &CheckSpec,
        correction: Option<&Correction>,
        expectation: &CheckExpectation,
        execution: &CheckExecution,
        duration_ms: u64,
    ) -> Self {
        let actual_exit = execution.exit_code();
        let output = execution.output();
        let passed = expectation.is_met(actual_exit, &output);

        let error_message = if passed {
            String::new()
        } else {
            execution
                .failure_message()
                .unwrap_or_else(|| expectation.failure_message().to_string())
        };

        let mut result = Self::base(spec, expectation.exit_code(), correction);
        result.actual_exit = actual_exit;
        result.output = truncate_output(&output, MAX_OUTPUT_CHARS);
        result.passed = passed;
        result.duration_ms = duration_ms;
        result.error_message = error_message;
        result
    }

    /// Build the result of a command rejected by the classifier.
    pub fn malformed(
        spec: &CheckSpec,
        correction: Option<&Correction>,
        expected_exit: i32,
        reason: &str,
    ) -> Self {
        let mut result = Self::base(spec, expected_exit, correction);
        result.actual_exit = EXIT_MALFORMED;
        result.output = format!("MALFORMED COMMAND: {}", reason);
        result.error_message = format!("Malformed command: {}", reason);
        result.malformed = true;
        result
    }

    /// Synthetic failure appended when prerequisite issues are unresolved.
    pub fn unresolved_dependencies(unresolved: &[String]) -> Self {
        Self {
            name: "dependency_check".to_string(),
            command: "check_dependencies".to_string(),
            corrected_command: None,
            correction_note: None,
            expected_exit: 0,
            actual_exit: 1,
            output: format!("Unresolved dependencies: {}", unresolved.join(", ")),
            passed: false,
            duration_ms: 0,
            error_message: "Dependencies not resolved".to_string(),
            malformed: false,
            was_auto_corrected: false,
        }
    }

    fn base(spec: &CheckSpec, expected_exit: i32, correction: Option<&Correction>) -> Self {
        let corrected = correction.filter(|c| c.was_corrected);
        Self {
            name: spec.name.clone(),
            command: spec.command.clone(),
            corrected_command: corrected.map(|c| c.command.clone()),
            correction_note: corrected.map(|c| c.note.clone()),
            expected_exit,
            actual_exit: 0,
            output: String::new(),
            passed: false,
            duration_ms: 0,
            error_message: String::new(),
            malformed: false,
            was_auto_corrected: corrected.is_some(),
        }
    }
}

/// Truncate to at most `max_chars` characters without splitting a character.
pub fn truncate_output(output: &str, max_chars: usize) -> String {
    match output.char_indices().nth(max_chars) {
        Some((idx, _)) => output[..idx].to_string(),
        None => output.to_string(),
    }
}
