//! Structural validation of verification commands.
//!
//! The classifier never executes anything. It looks for the shapes of
//! breakage the corrector cannot repair so those commands can be reported
//! as malformed instead of producing misleading shell errors.

use std::sync::LazyLock;

use regex_lite::Regex;

use super::SHELL_COMMAND_NAMES;

/// Verdict for a single command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Valid,
    Malformed { reason: String },
}

impl Classification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Classification::Valid)
    }

    fn malformed(reason: impl Into<String>) -> Self {
        Classification::Malformed {
            reason: reason.into(),
        }
    }
}

static TEST_FLAG_THEN_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"test\s+-[efds]\s+(?:ls|cat|grep|find|echo|test|python|python3|wc)(?:\s|$)")
        .expect("Invalid regex")
});

static ANGLE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[a-z_-]+>").expect("Invalid regex"));

static BRACE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[a-z_]+\}").expect("Invalid regex"));

static FILE_TEST_ON_DIRECTORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"test\s+-f\s+\S+/(?:\s|$)").expect("Invalid regex"));

static TEST_PATH_ARGUMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"test\s+-[efds][ \t]+([^\s;&|<>]+)(?:[ \t]+(\S+))?").expect("Invalid regex")
});

/// Classify a command as valid or malformed.
///
/// Checks run in a fixed order and the first hit wins.
pub fn classify(command: &str) -> Classification {
    if TEST_FLAG_THEN_COMMAND.is_match(command) {
        return Classification::malformed("Shell command used as file path");
    }

    if ANGLE_PLACEHOLDER.is_match(command) {
        return Classification::malformed("Unsubstituted template variable");
    }

    if has_brace_placeholder(command) {
        return Classification::malformed("Unsubstituted template placeholder");
    }

    if FILE_TEST_ON_DIRECTORY.is_match(command) {
        return Classification::malformed("Using -f on directory path");
    }

    for caps in TEST_PATH_ARGUMENT.captures_iter(command) {
        let path = &caps[1];

        // Quoted paths may legitimately contain spaces.
        if path.starts_with('"') || path.starts_with('\'') {
            continue;
        }

        if caps
            .get(2)
            .is_some_and(|next| !is_shell_operator(next.as_str()))
        {
            return Classification::malformed("Path contains unquoted spaces");
        }

        let first_segment = path.split('/').next().unwrap_or(path);
        if SHELL_COMMAND_NAMES.contains(&first_segment) {
            return Classification::malformed(format!(
                "Path starts with shell command '{}'",
                first_segment
            ));
        }
    }

    Classification::Valid
}

/// `{name}` placeholders, ignoring shell `${name}` expansions.
fn has_brace_placeholder(command: &str) -> bool {
    BRACE_PLACEHOLDER
        .find_iter(command)
        .any(|m| !command[..m.start()].ends_with('$'))
}

/// Tokens that may legally follow a test path.
fn is_shell_operator(token: &str) -> bool {
    const OPERATOR_PREFIXES: &[&str] = &["&", "|", ";", ")", "]", ">", "<", "-", "!", "\\"];

    OPERATOR_PREFIXES.iter().any(|p| token.starts_with(p))
        || token
            .strip_prefix(|c: char| c.is_ascii_digit())
            .is_some_and(|rest| rest.starts_with('>') || rest.starts_with('<'))
}
