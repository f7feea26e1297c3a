//! Shell execution of verification checks.

pub mod subprocess;

pub use subprocess::{
    CheckExecution, CommandExecutor, EXIT_EXECUTION_FAILED, EXIT_MALFORMED, ShellExecutor,
    check_shell_available,
};

#[cfg(test)]
pub use subprocess::MockCommandExecutor;
