//! vouch - A CLI tool that verifies claimed issue fixes.
//!
//! # Overview
//!
//! vouch reads issue records, runs the verification commands embedded in
//! them (or the checks of a named pattern from a catalog), repairs common
//! mistakes in those commands before running them, gates on prerequisite
//! issues, and writes a JSON evidence file for every run.

pub mod command;
pub mod config;
pub mod error;
pub mod issue;
pub mod pattern;
pub mod runner;
pub mod verification;

// Re-export commonly used types
pub use command::{Classification, Correction, auto_correct, classify};
pub use config::VerifierConfig;
pub use error::{CatalogError, EvidenceError, IssueError, RunnerError, StatusUpdateError};
pub use issue::{IssueRecord, IssueStore};
pub use pattern::{Depth, PatternCatalog};
pub use runner::{CheckExecution, CommandExecutor, ShellExecutor};
pub use verification::{
    BatchStats, CheckResult, VerificationOutcome, VerificationReport, Verifier, VerifyOptions,
    verify_batch,
};
