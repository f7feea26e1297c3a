//! Issue verification: orchestration, dependency gating, evidence and reporting.

pub mod batch;
pub mod check;
pub mod dependency;
pub mod evidence;
pub mod outcome;
pub mod report;
pub mod verifier;

pub use batch::{BatchStats, verify_batch};
pub use check::{CheckExpectation, CheckResult, CheckSpec, MAX_OUTPUT_CHARS, PASS_MARKER};
pub use dependency::DependencyGate;
pub use evidence::{EvidenceRecord, EvidenceStore};
pub use outcome::{EMBEDDED_COMMANDS, VerificationOutcome, VerificationReport, confidence_score};
pub use verifier::{Verifier, VerifyOptions};
