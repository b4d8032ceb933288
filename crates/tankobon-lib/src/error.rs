use serde::Serialize;
use thiserror::Error;

/// Failure reported by a source adapter.
///
/// `NotFound` is a definitive answer from the provider, `Unavailable` is worth
/// retrying later. Everything else is a hard failure that retrying won't fix.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("temporarily unavailable: {0}")]
    Unavailable(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type SourceResult<T> = Result<T, SourceError>;
