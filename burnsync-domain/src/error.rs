use thiserror::Error;

/// Failure classes surfaced by a refresh.
///
/// Library code returns `anyhow::Result` and attaches one of these as the
/// root cause, so callers can classify a failure with
/// `error.downcast_ref::<SyncError>()`.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing credential, unknown project name or unusable configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The issue tracker rejected the request or could not be reached.
    #[error("upstream error: {0}")]
    Upstream(String),
    /// Writing the sheet or exporting the workbook failed.
    #[error("render error for '{project}': {message}")]
    Render { project: String, message: String },
}

impl SyncError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    pub fn render(project: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Render {
            project: project.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Upstream(_) => "upstream",
            Self::Render { .. } => "render",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SyncError;

    #[test]
    fn formats_messages_with_kind_prefix() {
        let error = SyncError::configuration("token not set");
        assert_eq!(error.to_string(), "configuration error: token not set");
        assert_eq!(error.kind(), "configuration");

        let error = SyncError::render("Square", "sheet is locked");
        assert_eq!(error.to_string(), "render error for 'Square': sheet is locked");
        assert_eq!(error.kind(), "render");
    }

    #[test]
    fn survives_round_trip_through_anyhow() {
        let error = anyhow::Error::new(SyncError::upstream("boom")).context("fetching Square");
        let root = error.downcast_ref::<SyncError>().expect("sync error");
        assert_eq!(root.kind(), "upstream");
    }
}
