use std::fmt;

/// Outcome of one successful project refresh.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshReport {
    pub project: String,
    pub fetched: usize,
    pub tracked: usize,
    pub points: usize,
    pub remaining: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectFailure {
    pub project: String,
    /// `configuration`, `upstream`, `render` or `unexpected`.
    pub kind: &'static str,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub succeeded: Vec<RefreshReport>,
    pub failed: Vec<ProjectFailure>,
}

impl RefreshSummary {
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

impl fmt::Display for RefreshSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Refreshed {} customer(s)", self.succeeded_count())?;
        if self.failed_count() > 0 {
            write!(f, ", {} failed", self.failed_count())?;
        }
        Ok(())
    }
}
