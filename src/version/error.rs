use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// Transport failure, non-success status or malformed body.
    #[error("Failed to fetch releases for {repository}: {reason}")]
    FetchFailed { repository: String, reason: String },
}

impl SourceError {
    pub fn fetch_failed(repository: &str, reason: impl std::fmt::Display) -> Self {
        Self::FetchFailed {
            repository: repository.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConstraintError {
    #[error("Invalid constraint {expression:?}: {reason}")]
    Invalid { expression: String, reason: String },
}

impl ConstraintError {
    pub(crate) fn invalid(expression: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}
