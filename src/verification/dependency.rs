//! Prerequisite-issue gating.

use tracing::debug;

use crate::error::IssueError;
use crate::issue::IssueStore;

/// Checks declared dependencies against the issue store.
///
/// Dependencies are re-read from disk every time, so a prerequisite that
/// was resolved earlier in the same run is seen as resolved.
pub struct DependencyGate<'a> {
    store: &'a IssueStore,
}

impl<'a> DependencyGate<'a> {
    pub fn new(store: &'a IssueStore) -> Self {
        Self { store }
    }

    /// Dependencies that are not resolved, in declaration order.
    ///
    /// Missing records are tagged `(not found)`, records that exist but
    /// cannot be read or parsed are tagged `(unreadable)`.
    pub fn unresolved(&self, depends_on: &[String]) -> Vec<String> {
        depends_on
            .iter()
            .filter_map(|dep| {
                match self.store.load(dep) {
                    Ok(record) if record.is_resolved() => None,
                    Ok(_) => Some(dep.clone()),
                    Err(IssueError::NotFound(_) | IssueError::InvalidId(_)) => {
                        Some(format!("{} (not found)", dep))
                    }
                    Err(e) => {
                        debug!("Dependency {} could not be read: {}", dep, e);
                        Some(format!("{} (unreadable)", dep))
                    }
                }
            })
            .collect()
    }
}
