//! Pattern catalog loading.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::CatalogError;

use super::Depth;

/// Named check templates plus the categories each depth permits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatternCatalog {
    #[serde(default)]
    pub patterns: BTreeMap<String, Pattern>,
    #[serde(default)]
    pub depth_levels: HashMap<String, DepthLevel>,
}

/// A reusable set of check templates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Pattern {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub checks: Vec<CheckTemplate>,
}

/// One check in a pattern, before variable substitution.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckTemplate {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub expected_exit: i32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub failure_message: Option<String>,
}

/// Categories run at one depth. `None` when the level omits `checks`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepthLevel {
    #[serde(default)]
    pub checks: Option<Vec<String>>,
}

impl PatternCatalog {
    /// Load the catalog from a YAML file.
    ///
    /// A missing file yields an empty catalog so issues with embedded
    /// commands can still be verified.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Pattern catalog not found at {}", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(CatalogError::ReadFailed {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let catalog = Self::from_yaml(&content).map_err(|source| CatalogError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            "Loaded {} verification patterns from {}",
            catalog.patterns.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    pub fn pattern(&self, name: &str) -> Option<&Pattern> {
        self.patterns.get(name)
    }

    /// Categories configured for `depth`, if the catalog declares them.
    ///
    /// An explicitly empty list is kept and permits nothing.
    pub fn categories_for(&self, depth: Depth) -> Option<&[String]> {
        self.depth_levels
            .get(depth.as_str())
            .and_then(|level| level.checks.as_deref())
    }
}
