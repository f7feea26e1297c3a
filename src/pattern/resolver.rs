//! Expansion of pattern templates into concrete checks.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::verification::CheckSpec;

use super::{CheckTemplate, Depth, PatternCatalog};

/// Categories run when the catalog does not configure a depth.
pub const FALLBACK_CATEGORIES: &[&str] = &["existence", "content_validation", "git_tracking"];

/// A pattern check ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCheck {
    pub spec: CheckSpec,
    pub expected_exit: i32,
    pub failure_message: Option<String>,
}

/// Values substituted into `{name}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternVariables(BTreeMap<String, String>);

impl PatternVariables {
    /// Variables for an issue. Path variables come from the first target path.
    pub fn for_issue(issue_id: &str, lane: &str, target_paths: &[String]) -> Self {
        let mut vars = BTreeMap::new();
        vars.insert("issue_id".to_string(), issue_id.to_string());
        vars.insert("lane".to_string(), lane.to_string());

        if let Some(first) = target_paths.first() {
            let dir = Path::new(first)
                .parent()
                .map(|p| p.to_string_lossy().into_owned())
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| first.clone());
            vars.insert("file_path".to_string(), first.clone());
            vars.insert("dir_path".to_string(), dir);
            vars.insert("script_path".to_string(), first.clone());
        }

        Self(vars)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Replace every known `{name}` in `template`. Unknown names are left as is.
    pub fn substitute(&self, template: &str) -> String {
        self.0
            .iter()
            .fold(template.to_string(), |acc, (name, value)| {
                acc.replace(&format!("{{{}}}", name), value)
            })
    }
}

/// Category of a template, explicit or inferred from its name.
pub fn template_category(template: &CheckTemplate) -> String {
    if let Some(category) = template.category.as_deref().filter(|c| !c.is_empty()) {
        return category.to_string();
    }

    let name = template.name.to_lowercase();
    if name.contains("exist") {
        "existence".to_string()
    } else if name.contains("git") || name.contains("tracked") {
        "git_tracking".to_string()
    } else {
        "content_validation".to_string()
    }
}

impl PatternCatalog {
    /// Expand `pattern_name` into the checks permitted at `depth`.
    ///
    /// An unknown pattern yields no checks.
    pub fn resolve(
        &self,
        pattern_name: &str,
        vars: &PatternVariables,
        depth: Depth,
    ) -> Vec<ResolvedCheck> {
        let Some(pattern) = self.pattern(pattern_name) else {
            warn!("Unknown verification pattern '{}'", pattern_name);
            return Vec::new();
        };

        let permitted: Vec<&str> = match self.categories_for(depth) {
            Some(categories) => categories.iter().map(String::as_str).collect(),
            None => FALLBACK_CATEGORIES.to_vec(),
        };

        let checks: Vec<ResolvedCheck> = pattern
            .checks
            .iter()
            .filter(|t| depth == Depth::Deep || permitted.contains(&template_category(t).as_str()))
            .map(|t| ResolvedCheck {
                spec: CheckSpec {
                    label: None,
                    name: t.name.clone(),
                    command: vars.substitute(&t.command),
                },
                expected_exit: t.expected_exit,
                failure_message: t.failure_message.clone(),
            })
            .collect();

        debug!(
            "Pattern '{}' at {} resolved to {} of {} checks",
            pattern_name,
            depth,
            checks.len(),
            pattern.checks.len()
        );
        checks
    }
}
