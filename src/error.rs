//! Error types for vouch modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from locating and parsing issue records.
///
/// These are fatal to the verification of one issue only.
#[derive(Error, Debug)]
pub enum IssueError {
    #[error("Invalid issue identifier '{0}'")]
    InvalidId(String),

    #[error("Issue file not found for {0}")]
    NotFound(String),

    #[error("Error reading {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No frontmatter found in {0}")]
    MissingFrontmatter(PathBuf),

    #[error("Frontmatter in {0} is not closed with ---")]
    UnclosedFrontmatter(PathBuf),

    #[error("Error parsing frontmatter in {path}: {source}")]
    InvalidFrontmatter {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors from loading the verification pattern catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read pattern catalog {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse pattern catalog {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Errors from writing verification evidence.
#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("Failed to create evidence directory {path}: {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize evidence: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    #[error("Failed to write evidence file: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Failed to persist evidence file {path}: {source}")]
    PersistFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read evidence file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Evidence file {path} is not a valid record: {source}")]
    InvalidRecord {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from recording a successful verification in the issue file.
#[derive(Error, Debug)]
pub enum StatusUpdateError {
    #[error("Failed to read issue file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Issue file {0} has no closed frontmatter block")]
    MissingFrontmatter(PathBuf),

    #[error("Failed to write issue file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the command runner preflight.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error(
        "A POSIX shell (sh) is required to run verification commands but was not found in PATH"
    )]
    ShellNotInstalled,
}
