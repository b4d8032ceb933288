use async_trait::async_trait;

use crate::{
    error::SourceResult,
    models::{ChapterListing, SourceInfo, TitleCandidate, TitleMatch},
};

/// A content provider.
///
/// Implementations must not cache: every call reflects the provider's current
/// state. A provider that has no such title answers `SourceError::NotFound`,
/// transport and parse failures are `SourceError::Unavailable`.
#[async_trait]
pub trait Source: Send + Sync {
    fn source_info(&self) -> SourceInfo;

    /// Searches the provider. Never returns an empty list, answers
    /// `NotFound` instead.
    async fn resolve(&self, query: &str) -> SourceResult<Vec<TitleCandidate>>;

    /// Every chapter listed for `title`, in provider order
    async fn list_chapters(&self, title: &TitleMatch) -> SourceResult<ChapterListing>;

    /// Image urls of the chapter at `path`
    async fn fetch_pages(&self, path: &str) -> SourceResult<Vec<String>>;
}
