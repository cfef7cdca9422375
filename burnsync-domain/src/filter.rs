use crate::{Issue, SyncError};

pub const DEFAULT_TITLE_MARKER: &str = "ghissue";

/// Keeps issues whose title carries a naming-convention marker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TitleFilter {
    marker: String,
}

impl TitleFilter {
    pub fn new(marker: &str) -> Result<Self, SyncError> {
        let trimmed = marker.trim();
        if trimmed.is_empty() {
            return Err(SyncError::configuration("title marker cannot be empty"));
        }
        Ok(Self {
            marker: trimmed.to_lowercase(),
        })
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn matches(&self, title: &str) -> bool {
        title.to_lowercase().contains(&self.marker)
    }

    /// Order-preserving subsequence of `issues` whose titles match.
    pub fn apply(&self, issues: &[Issue]) -> Vec<Issue> {
        issues
            .iter()
            .filter(|issue| self.matches(&issue.title))
            .cloned()
            .collect()
    }
}

impl Default for TitleFilter {
    fn default() -> Self {
        Self {
            marker: DEFAULT_TITLE_MARKER.to_string(),
        }
    }
}
