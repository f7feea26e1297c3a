//! Reusable verification patterns.
//!
//! Issues without embedded verification commands fall back to a named
//! pattern from the catalog. Templates are expanded with per-issue
//! variables and filtered by the requested [`Depth`].

pub mod catalog;
pub mod depth;
pub mod resolver;

pub use catalog::{CheckTemplate, DepthLevel, Pattern, PatternCatalog};
pub use depth::Depth;
pub use resolver::{FALLBACK_CATEGORIES, PatternVariables, ResolvedCheck, template_category};

/// Pattern used when an issue does not declare one.
pub const DEFAULT_PATTERN: &str = "missing_file";
