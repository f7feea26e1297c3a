//! Verification command repair and validation.
//!
//! Commands embedded in issue records are hand-written and frequently
//! malformed. They are first rewritten by the [`corrector`] and then checked
//! by the [`classifier`]; only commands the classifier accepts are executed.

pub mod classifier;
pub mod corrector;

pub use classifier::{Classification, classify};
pub use corrector::{Correction, auto_correct};

/// Shell commands that show up where a path was expected.
pub(crate) const SHELL_COMMAND_NAMES: &[&str] = &[
    "ls", "cat", "grep", "find", "echo", "test", "python", "python3", "wc",
];
