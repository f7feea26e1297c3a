//! Rule-based auto-correction of malformed verification commands.
//!
//! Each rule is a pure string rewrite that either fires (returning the new
//! command and a note) or does nothing. Rules run in a fixed priority order
//! and several may fire on the same command. Nothing is executed here.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Outcome of running a command through the correction rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    /// The command after all rules were applied.
    pub command: String,
    /// True iff `command` differs from the input.
    pub was_corrected: bool,
    /// Notes from every rule that fired, joined with `; `.
    pub note: String,
}

type Rule = fn(&str) -> Option<(String, String)>;

/// Correction rules in priority order.
const RULES: &[Rule] = &[
    directory_test_flag,
    wildcard_test,
    git_ls_files_wildcard,
    stray_comment_marker,
    placeholder_in_test_path,
    placeholder_in_git_ls_files,
    command_used_as_path,
    absolute_test_path,
];

const PASS_TAIL: &str = r#"&& echo "PASS""#;

static FILE_TEST_ON_DIRECTORY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"test\s+-f\s+(\S+/)(\s|$)").expect("Invalid regex"));

static WILDCARD_TEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"test\s+-[fdse]\s+(\S*\*\S*)\s*&&\s*echo\s+"?PASS"?"#).expect("Invalid regex")
});

static GIT_LS_FILES_WILDCARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"git\s+ls-files\s+--error-unmatch\s+(\S*\*\S*).*&&\s*echo\s+"?PASS"?"#)
        .expect("Invalid regex")
});

static COMMENT_IN_TEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"test\s+-([fd])\s+#\s*(\S+)").expect("Invalid regex"));

static PLACEHOLDER_TEST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"test\s+-[fdse]\s+/?([^\s<{$]*)(?:<[a-z_-]+>|\{[a-z_]+\})\S*\s*&&\s*echo\s+"?PASS"?"#,
    )
    .expect("Invalid regex")
});

static PLACEHOLDER_GIT_LS_FILES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"git\s+ls-files\s+--error-unmatch\s+/?([^\s<{$]*)(?:<[a-z_-]+>|\{[a-z_]+\})\S*.*&&\s*echo\s+"?PASS"?"#,
    )
    .expect("Invalid regex")
});

static TEST_WRAPPED_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"test\s+-[fdse]\s+((?:ls|cat|grep|find|wc)\s)").expect("Invalid regex")
});

static ABSOLUTE_TEST_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"test\s+-([fd])\s+/([A-Za-z])").expect("Invalid regex"));

/// Attempt to auto-correct a verification command.
///
/// Applies every rule in priority order. The returned command is identical
/// to the input when no rule fires.
pub fn auto_correct(command: &str) -> Correction {
    let mut current = command.to_string();
    let mut notes = Vec::new();

    for rule in RULES {
        if let Some((rewritten, note)) = rule(&current) {
            current = rewritten;
            notes.push(note);
        }
    }

    Correction {
        was_corrected: current != command,
        command: current,
        note: notes.join("; "),
    }
}

/// Replace every match, returning `None` when nothing changed.
fn replace_all(re: &Regex, input: &str, replacement: &str) -> Option<String> {
    let rewritten = re.replace_all(input, replacement);
    (rewritten != input).then(|| rewritten.into_owned())
}

/// `test -f dir/` → `test -d dir/`
fn directory_test_flag(command: &str) -> Option<(String, String)> {
    replace_all(&FILE_TEST_ON_DIRECTORY, command, "test -d ${1}${2}")
        .map(|c| (c, "Changed -f to -d for directory path".to_string()))
}

/// `test -f templates/*.j2 && echo PASS` → `ls templates/*.j2 >/dev/null 2>&1 && echo "PASS"`
fn wildcard_test(command: &str) -> Option<(String, String)> {
    let replacement = format!("ls ${{1}} >/dev/null 2>&1 {}", PASS_TAIL);
    replace_all(&WILDCARD_TEST, command, &replacement)
        .map(|c| (c, "Converted wildcard test to ls command".to_string()))
}

/// `git ls-files --error-unmatch src/*.rs && echo PASS` → `ls src/*.rs ...`
fn git_ls_files_wildcard(command: &str) -> Option<(String, String)> {
    let replacement = format!("ls ${{1}} >/dev/null 2>&1 {}", PASS_TAIL);
    replace_all(&GIT_LS_FILES_WILDCARD, command, &replacement)
        .map(|c| (c, "Converted git ls-files wildcard to ls command".to_string()))
}

/// `test -f # docs/a.md` → `test -f docs/a.md`
fn stray_comment_marker(command: &str) -> Option<(String, String)> {
    replace_all(&COMMENT_IN_TEST, command, "test -${1} ${2}")
        .map(|c| (c, "Removed comment character from path".to_string()))
}

/// `test -f LogBook/bricks/<brick-id>/status.yaml && echo PASS` → `test -d LogBook/bricks/ && echo "PASS"`
fn placeholder_in_test_path(command: &str) -> Option<(String, String)> {
    replace_placeholder(&PLACEHOLDER_TEST, command)
        .map(|(c, parent)| (c, format!("Replaced placeholder with parent directory test: {}/", parent)))
}

/// Same as [`placeholder_in_test_path`] for tracked-file checks.
fn placeholder_in_git_ls_files(command: &str) -> Option<(String, String)> {
    replace_placeholder(&PLACEHOLDER_GIT_LS_FILES, command).map(|(c, parent)| {
        (
            c,
            format!("Replaced git ls-files placeholder with parent directory test: {}/", parent),
        )
    })
}

/// Rewrite the first placeholder match into a parent directory test.
///
/// Shell `${name}` expansions never match since the prefix stops at `$`.
/// The parent is the path prefix up to the last `/` before the placeholder.
/// A placeholder in the first path segment has no usable parent.
fn replace_placeholder(re: &Regex, command: &str) -> Option<(String, String)> {
    let caps = re.captures(command)?;
    let whole = caps.get(0)?;
    let prefix = caps.get(1).map(|m| m.as_str()).unwrap_or("");

    let parent = prefix[..prefix.rfind('/')?].trim_end_matches('/');
    if parent.is_empty() {
        return None;
    }

    let rewritten = format!(
        "{}test -d {}/ {}{}",
        &command[..whole.start()],
        parent,
        PASS_TAIL,
        &command[whole.end()..]
    );
    Some((rewritten, parent.to_string()))
}

/// `test -f ls docs/` → `ls docs/`
fn command_used_as_path(command: &str) -> Option<(String, String)> {
    let rewritten = TEST_WRAPPED_COMMAND.replacen(command, 1, "${1}");
    (rewritten != command).then(|| {
        (
            rewritten.into_owned(),
            "Removed incorrect test wrapper from command".to_string(),
        )
    })
}

/// `test -f /docs/a.md` → `test -f docs/a.md`
fn absolute_test_path(command: &str) -> Option<(String, String)> {
    replace_all(&ABSOLUTE_TEST_PATH, command, "test -${1} ${2}")
        .map(|c| (c, "Converted absolute path to relative".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_test_on_directory_uses_directory_flag() {
        let correction = auto_correct("test -f config/ && echo PASS");

        assert_eq!(correction.command, "test -d config/ && echo PASS");
        assert!(correction.was_corrected);
        assert_eq!(correction.note, "Changed -f to -d for directory path");
    }

    #[test]
    fn test_directory_flag_applies_to_every_trailing_slash_form() {
        let commands = [
            "test -f LogBook/audit/ && echo PASS",
            "test  -f  a/b/c/ && echo \"PASS\"",
            "test -f docs/",
            "test -f src/ || exit 1",
        ];

        for command in commands {
            let correction = auto_correct(command);
            assert!(
                correction.command.contains("test -d "),
                "expected -d in '{}'",
                correction.command
            );
            assert!(!correction.command.contains("test -f"));
            assert!(correction.was_corrected, "'{}' should be corrected", command);
        }
    }

    #[test]
    fn test_file_test_on_regular_file_untouched() {
        let correction = auto_correct("test -f docs/readme.md && echo PASS");

        assert_eq!(correction.command, "test -f docs/readme.md && echo PASS");
        assert!(!correction.was_corrected);
        assert!(correction.note.is_empty());
    }

    #[test]
    fn test_wildcard_test_becomes_ls() {
        let correction = auto_correct("test -s LogBook/*/STATE.md && echo PASS");

        assert_eq!(
            correction.command,
            r#"ls LogBook/*/STATE.md >/dev/null 2>&1 && echo "PASS""#
        );
        assert_eq!(correction.note, "Converted wildcard test to ls command");
    }

    #[test]
    fn test_wildcard_without_pass_tail_untouched() {
        let correction = auto_correct("test -f templates/*.jinja2");
        assert!(!correction.was_corrected);
    }

    #[test]
    fn test_git_ls_files_wildcard_becomes_ls() {
        let correction =
            auto_correct("git ls-files --error-unmatch src/*.rs >/dev/null && echo PASS");

        assert_eq!(correction.command, r#"ls src/*.rs >/dev/null 2>&1 && echo "PASS""#);
        assert_eq!(correction.note, "Converted git ls-files wildcard to ls command");
    }

    #[test]
    fn test_stray_comment_marker_removed() {
        let correction = auto_correct("test -f # LogBook/foo.md && echo PASS");

        assert_eq!(correction.command, "test -f LogBook/foo.md && echo PASS");
        assert_eq!(correction.note, "Removed comment character from path");
    }

    #[test]
    fn test_angle_placeholder_becomes_parent_directory_test() {
        let correction =
            auto_correct("test -f /LogBook/bricks/<brick-id>/status.yaml && echo PASS");

        assert_eq!(correction.command, r#"test -d LogBook/bricks/ && echo "PASS""#);
        assert_eq!(
            correction.note,
            "Replaced placeholder with parent directory test: LogBook/bricks/"
        );
    }

    #[test]
    fn test_brace_placeholder_mid_segment_uses_enclosing_directory() {
        let correction = auto_correct("test -s docs/reports/run_{date}.md && echo PASS");

        assert_eq!(correction.command, r#"test -d docs/reports/ && echo "PASS""#);
    }

    #[test]
    fn test_shell_expansion_in_path_is_not_a_placeholder() {
        for command in [
            "test -f docs/${name}/guide.md && echo PASS",
            "git ls-files --error-unmatch src/${module}/mod.rs && echo PASS",
        ] {
            let correction = auto_correct(command);

            assert!(!correction.was_corrected, "{}", command);
            assert_eq!(correction.command, command);
            assert!(crate::command::classify(&correction.command).is_valid());
        }
    }

    #[test]
    fn test_placeholder_in_first_segment_left_for_classifier() {
        let correction = auto_correct("test -f <brick-id>/status.yaml && echo PASS");
        assert!(!correction.was_corrected);
    }

    #[test]
    fn test_git_placeholder_becomes_parent_directory_test() {
        let correction = auto_correct(
            "git ls-files --error-unmatch LogBook/<brick-id>/status.yaml >/dev/null && echo PASS",
        );

        assert_eq!(correction.command, r#"test -d LogBook/ && echo "PASS""#);
        assert!(correction.note.contains("git ls-files placeholder"));
    }

    #[test]
    fn test_command_used_as_path_unwrapped() {
        let correction = auto_correct("test -f ls LogBook/builder/ && echo PASS");

        assert_eq!(correction.command, "ls LogBook/builder/ && echo PASS");
        assert_eq!(correction.note, "Removed incorrect test wrapper from command");
    }

    #[test]
    fn test_wc_used_as_path_unwrapped() {
        let correction = auto_correct("test -f wc -l docs/foo.md && echo PASS");
        assert_eq!(correction.command, "wc -l docs/foo.md && echo PASS");
    }

    #[test]
    fn test_only_first_wrapped_command_unwrapped() {
        let correction = auto_correct("test -f cat a.txt && test -f grep b.txt");
        assert_eq!(correction.command, "cat a.txt && test -f grep b.txt");
    }

    #[test]
    fn test_absolute_path_made_relative() {
        let correction = auto_correct("test -f /docs/a.md && test -d /src && echo PASS");

        assert_eq!(correction.command, "test -f docs/a.md && test -d src && echo PASS");
        assert_eq!(correction.note, "Converted absolute path to relative");
    }

    #[test]
    fn test_multiple_rules_fire_in_priority_order() {
        let correction = auto_correct("test -f /LogBook/audit/ && echo PASS");

        assert_eq!(correction.command, "test -d LogBook/audit/ && echo PASS");
        assert_eq!(
            correction.note,
            "Changed -f to -d for directory path; Converted absolute path to relative"
        );
    }

    #[test]
    fn test_correction_is_idempotent() {
        let first = auto_correct("test -f # /docs/guide.md && echo PASS");
        let second = auto_correct(&first.command);

        assert_eq!(first.command, "test -f docs/guide.md && echo PASS");
        assert!(!second.was_corrected);
        assert_eq!(second.command, first.command);
    }

    #[test]
    fn test_valid_commands_pass_through() {
        for command in [
            "grep -q 'fn main' src/main.rs && echo PASS",
            "test -d src/ && echo PASS",
            "git ls-files --error-unmatch src/lib.rs >/dev/null && echo PASS",
            "",
        ] {
            let correction = auto_correct(command);
            assert!(!correction.was_corrected, "'{}' should not change", command);
            assert_eq!(correction.command, command);
        }
    }
}
