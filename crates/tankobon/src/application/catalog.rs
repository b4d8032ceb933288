use std::{collections::BTreeMap, fmt, future::Future, sync::Arc, time::Duration};

use futures::future::join_all;
use itertools::Itertools;
use serde::{Serialize, Serializer, ser::SerializeStruct};
use tankobon_lib::prelude::*;
use tankobon_sources::prelude::SourceManager;
use thiserror::Error;

use crate::domain::{
    entities::{
        catalog::{Catalog, CatalogEntry},
        trust::TrustRanks,
    },
    services::{
        merger::CatalogMerger,
        normalizer::ChapterNormalizer,
        resolver::{ResolveError, TitleResolver},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Resolve,
    ListChapters,
    FetchPages,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resolve => write!(f, "resolve"),
            Stage::ListChapters => write!(f, "list chapters"),
            Stage::FetchPages => write!(f, "fetch pages"),
        }
    }
}

/// Why one provider contributed nothing
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProviderError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("task failed: {0}")]
    Task(String),
}

impl ProviderError {
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Resolve(ResolveError::TitleNotFound(_)) => "title_not_found",
            ProviderError::Resolve(ResolveError::AmbiguousTitle { .. }) => "ambiguous_title",
            ProviderError::Resolve(ResolveError::Source(e)) | ProviderError::Source(e) => match e {
                SourceError::NotFound(_) => "not_found",
                SourceError::Unavailable(_) => "provider_unavailable",
                SourceError::Rejected(_) => "rejected",
                SourceError::Unsupported(_) => "unsupported",
            },
            ProviderError::TimedOut(_) => "timed_out",
            ProviderError::Task(_) => "task_failed",
        }
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Resolve(ResolveError::Source(e)) | ProviderError::Source(e) => {
                e.is_retryable()
            }
            ProviderError::TimedOut(_) => true,
            _ => false,
        }
    }
}

impl Serialize for ProviderError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProviderError", 3)?;
        state.serialize_field("kind", self.kind())?;
        state.serialize_field("message", &self.to_string())?;
        state.serialize_field("retryable", &self.is_retryable())?;
        state.end()
    }
}

/// A provider that failed at some stage, reported next to the results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderFailure {
    pub source_id: String,
    pub stage: Stage,
    pub error: ProviderError,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.source_id, self.stage, self.error)
    }
}

/// A listing a provider could not finish; its records are still in the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncompleteListing {
    pub source_id: String,
    pub reason: IncompleteReason,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no source enabled")]
    NoSources,
    #[error("title is not resolved on any enabled source")]
    NothingToFetch,
    #[error("all providers failed: {}", .failures.iter().join("; "))]
    AllProvidersFailed { failures: Vec<ProviderFailure> },
    #[error("ambiguous title, pick one with an alias: {}", candidate_list(.candidates))]
    AmbiguousTitle {
        candidates: Vec<TitleMatch>,
        failures: Vec<ProviderFailure>,
    },
    #[error("no source could serve {label:?}: {error}")]
    PagesUnavailable { label: String, error: ProviderError },
    #[error("invalid chapter pattern: {0}")]
    Pattern(#[from] fancy_regex::Error),
}

fn candidate_list(candidates: &[TitleMatch]) -> String {
    candidates
        .iter()
        .map(|c| format!("{:?} ({})", c.title, c.source_id))
        .join(", ")
}

#[derive(Debug, Clone, Serialize)]
pub struct TitleResolution {
    pub title: Title,
    pub failures: Vec<ProviderFailure>,
}

/// The catalog for one title, with every provider failure that shaped it
#[derive(Debug, Clone, Serialize)]
pub struct CatalogReport {
    pub title: Title,
    #[serde(flatten)]
    pub catalog: Catalog,
    pub failures: Vec<ProviderFailure>,
    pub incomplete: Vec<IncompleteListing>,
    /// Some provider failed or stopped paginating early
    pub partial: bool,
}

impl CatalogReport {
    fn refresh_partial(&mut self) {
        self.partial = !self.failures.is_empty() || !self.incomplete.is_empty();
    }
}

#[derive(Debug, Clone)]
pub struct CatalogOptions {
    pub trust: TrustRanks,
    pub similarity_tolerance: f64,
    pub min_similarity: f64,
    pub provider_timeout: Duration,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            trust: TrustRanks::default(),
            similarity_tolerance: 0.05,
            min_similarity: 0.5,
            provider_timeout: Duration::from_secs(60),
        }
    }
}

/// Runs resolution and catalog building across every registered source.
///
/// Each provider call runs in its own task under its own timeout. Results are
/// only combined after every task finished, so a slow or failing provider
/// costs its own contribution and nothing else.
pub struct CatalogService {
    sources: BTreeMap<String, Arc<dyn Source>>,
    normalizer: Arc<ChapterNormalizer>,
    resolver: TitleResolver,
    merger: CatalogMerger,
    timeout: Duration,
}

impl CatalogService {
    pub fn new(manager: &SourceManager, options: CatalogOptions) -> Result<Self, CatalogError> {
        Ok(Self {
            sources: manager
                .all()
                .into_iter()
                .map(|source| (source.source_info().id, source))
                .collect(),
            normalizer: Arc::new(ChapterNormalizer::new()?),
            resolver: TitleResolver::new(
                options.similarity_tolerance,
                options.min_similarity,
                options.trust.clone(),
            ),
            merger: CatalogMerger::new(options.trust),
            timeout: options.provider_timeout,
        })
    }

    /// Runs `op` once per provider, each in its own task, and waits for all of them
    async fn fan_out<I, T, F, Fut>(
        &self,
        inputs: Vec<(String, I)>,
        op: F,
    ) -> Vec<(String, Result<T, ProviderError>)>
    where
        T: Send + 'static,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>> + Send + 'static,
    {
        let limit = self.timeout;
        let tasks = inputs.into_iter().map(|(id, input)| {
            let fut = op(input);
            let handle = tokio::spawn(async move {
                match tokio::time::timeout(limit, fut).await {
                    Ok(res) => res,
                    Err(_) => Err(ProviderError::TimedOut(limit)),
                }
            });

            async move {
                let res = match handle.await {
                    Ok(res) => res,
                    Err(e) => Err(ProviderError::Task(e.to_string())),
                };
                (id, res)
            }
        });

        join_all(tasks).await
    }

    pub async fn resolve_title(
        &self,
        query: &str,
        aliases: &[String],
    ) -> Result<TitleResolution, CatalogError> {
        if self.sources.is_empty() {
            return Err(CatalogError::NoSources);
        }

        let inputs = self
            .sources
            .iter()
            .map(|(id, source)| (id.clone(), source.clone()))
            .collect();
        let results = self
            .fan_out(inputs, |source: Arc<dyn Source>| {
                let query = query.to_string();
                async move {
                    let candidates = source.resolve(&query).await.map_err(|e| match e {
                        SourceError::NotFound(message) => ResolveError::TitleNotFound(message),
                        e => ResolveError::Source(e),
                    });
                    candidates.map_err(ProviderError::from)
                }
            })
            .await;

        let mut matches = vec![];
        let mut failures = vec![];
        let mut ambiguous = vec![];
        for (source_id, res) in results {
            let selected = res.and_then(|candidates| {
                self.resolver
                    .select(query, aliases, candidates)
                    .map_err(ProviderError::from)
            });

            match selected {
                Ok(found) => {
                    info!("{source_id}: {query:?} resolved to {:?} ({})", found.title, found.id);
                    matches.push(found);
                }
                Err(error) => {
                    warn!("{source_id}: could not resolve {query:?}: {error}");
                    if let ProviderError::Resolve(ResolveError::AmbiguousTitle { candidates }) = &error {
                        ambiguous.extend(candidates.iter().cloned());
                    }
                    failures.push(ProviderFailure {
                        source_id,
                        stage: Stage::Resolve,
                        error,
                    });
                }
            }
        }

        match self.resolver.assemble(query, aliases, matches) {
            Some(title) => Ok(TitleResolution { title, failures }),
            None if !ambiguous.is_empty() => Err(CatalogError::AmbiguousTitle {
                candidates: ambiguous,
                failures,
            }),
            None => Err(CatalogError::AllProvidersFailed { failures }),
        }
    }

    pub async fn build_catalog(&self, title: &Title) -> Result<CatalogReport, CatalogError> {
        let inputs: Vec<(String, (Arc<dyn Source>, TitleMatch))> = title
            .ids
            .iter()
            .filter_map(|(source_id, found)| match self.sources.get(source_id) {
                Some(source) => Some((source_id.clone(), (source.clone(), found.clone()))),
                None => {
                    warn!("{source_id} resolved {} but is not enabled", title.name);
                    None
                }
            })
            .collect();
        if inputs.is_empty() {
            return Err(CatalogError::NothingToFetch);
        }

        let attempted = inputs.len();
        let results = self
            .fan_out(inputs, |(source, found): (Arc<dyn Source>, TitleMatch)| async move {
                source
                    .list_chapters(&found)
                    .await
                    .map_err(ProviderError::from)
            })
            .await;

        let mut catalog = Catalog::default();
        let mut failures = vec![];
        let mut incomplete = vec![];
        for (source_id, res) in results {
            match res {
                Ok(listing) => {
                    if let PaginationStatus::Incomplete { reason } = &listing.pagination {
                        warn!("{source_id}: chapter list incomplete, {reason}");
                        incomplete.push(IncompleteListing {
                            source_id: source_id.clone(),
                            reason: reason.clone(),
                        });
                    }

                    let normalized = self.normalizer.normalize(listing.records);
                    debug!(
                        "{source_id}: {} numbered, {} unnumbered chapters",
                        normalized.chapters.len(),
                        normalized.unnumbered.len()
                    );
                    self.merger.merge(&mut catalog, normalized);
                }
                Err(error) => {
                    warn!("{source_id}: could not list chapters: {error}");
                    failures.push(ProviderFailure {
                        source_id,
                        stage: Stage::ListChapters,
                        error,
                    });
                }
            }
        }

        if failures.len() == attempted {
            return Err(CatalogError::AllProvidersFailed { failures });
        }

        info!(
            "{}: {} chapters, {} unnumbered, {} locked",
            title.name,
            catalog.len(),
            catalog.unnumbered.len(),
            catalog.locked_count()
        );

        let mut report = CatalogReport {
            title: title.clone(),
            catalog,
            failures,
            incomplete,
            partial: false,
        };
        report.refresh_partial();

        Ok(report)
    }

    /// Resolves `query` and builds its catalog, keeping failures of both stages
    pub async fn collect(&self, query: &str, aliases: &[String]) -> Result<CatalogReport, CatalogError> {
        let resolution = self.resolve_title(query, aliases).await?;
        let mut report = match self.build_catalog(&resolution.title).await {
            Ok(report) => report,
            Err(CatalogError::AllProvidersFailed { failures }) => {
                let mut all = resolution.failures;
                all.extend(failures);
                return Err(CatalogError::AllProvidersFailed { failures: all });
            }
            Err(e) => return Err(e),
        };

        let mut failures = resolution.failures;
        failures.append(&mut report.failures);
        report.failures = failures;
        report.refresh_partial();

        Ok(report)
    }

    /// Page images for a catalog entry, trying the winner and then each
    /// alternate, unlocked occurrences first
    pub async fn fetch_pages(&self, entry: &CatalogEntry) -> Result<Vec<String>, CatalogError> {
        let mut occurrences: Vec<&NormalizedChapter> = entry.occurrences().collect();
        occurrences.sort_by_key(|chapter| chapter.locked);

        let mut last_error = None;
        for chapter in occurrences {
            let Some(source) = self.sources.get(&chapter.source_id) else {
                debug!("{} is not enabled, skipping {}", chapter.source_id, chapter.url);
                continue;
            };

            let res = match tokio::time::timeout(self.timeout, source.fetch_pages(&chapter.url)).await {
                Ok(res) => res.map_err(ProviderError::from),
                Err(_) => Err(ProviderError::TimedOut(self.timeout)),
            };
            match res {
                Ok(pages) if !pages.is_empty() => return Ok(pages),
                Ok(_) => {
                    last_error = Some(ProviderError::Source(SourceError::NotFound(format!(
                        "{} has no pages",
                        chapter.url
                    ))))
                }
                Err(e) => {
                    warn!("{}: pages for {} failed: {e}", chapter.source_id, chapter.label);
                    last_error = Some(e);
                }
            }
        }

        let error = last_error.ok_or(CatalogError::NothingToFetch)?;
        Err(CatalogError::PagesUnavailable {
            label: entry.winner.label.clone(),
            error,
        })
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod test {
    use std::time::Instant;

    use async_trait::async_trait;

    use super::*;

    #[derive(Clone)]
    struct MockSource {
        id: &'static str,
        candidates: SourceResult<Vec<TitleCandidate>>,
        listing: SourceResult<ChapterListing>,
        pages: SourceResult<Vec<String>>,
        delay: Duration,
    }

    impl MockSource {
        fn new(id: &'static str) -> Self {
            Self {
                id,
                candidates: Err(SourceError::NotFound(format!("{id} has nothing"))),
                listing: Ok(ChapterListing::complete(vec![])),
                pages: Err(SourceError::Unavailable("image host down".to_string())),
                delay: Duration::ZERO,
            }
        }

        fn candidate(&self, index: usize, title: &str) -> TitleCandidate {
            TitleCandidate {
                source_id: self.id.to_string(),
                id: format!("{}-{index}", self.id),
                title: title.to_string(),
                url: format!("https://{}.example/title/{title}", self.id),
                alt_titles: vec![],
            }
        }

        fn titled(mut self, titles: &[&str]) -> Self {
            let candidates = titles
                .iter()
                .enumerate()
                .map(|(i, title)| self.candidate(i, title))
                .collect();
            self.candidates = Ok(candidates);
            self
        }

        fn chapters(mut self, chapters: &[(&str, bool)]) -> Self {
            let records = chapters
                .iter()
                .map(|(label, locked)| RawChapterRecord {
                    source_id: self.id.to_string(),
                    label: label.to_string(),
                    url: format!("https://{}.example/{}", self.id, label.replace(' ', "-")),
                    uploaded: None,
                    locked: *locked,
                })
                .collect();
            self.listing = Ok(ChapterListing::complete(records));
            self
        }

        fn listing_status(mut self, status: PaginationStatus) -> Self {
            if let Ok(listing) = &mut self.listing {
                listing.pagination = status;
            }
            self
        }

        fn listing_error(mut self, error: SourceError) -> Self {
            self.listing = Err(error);
            self
        }

        fn pages(mut self, pages: &[&str]) -> Self {
            self.pages = Ok(pages.iter().map(|p| p.to_string()).collect());
            self
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl Source for MockSource {
        fn source_info(&self) -> SourceInfo {
            SourceInfo {
                id: self.id.to_string(),
                name: self.id.to_uppercase(),
                url: format!("https://{}.example", self.id),
                version: "0.0.0".to_string(),
            }
        }

        async fn resolve(&self, _query: &str) -> SourceResult<Vec<TitleCandidate>> {
            tokio::time::sleep(self.delay).await;
            self.candidates.clone()
        }

        async fn list_chapters(&self, _title: &TitleMatch) -> SourceResult<ChapterListing> {
            self.listing.clone()
        }

        async fn fetch_pages(&self, _path: &str) -> SourceResult<Vec<String>> {
            self.pages.clone()
        }
    }

    fn service(sources: Vec<MockSource>, timeout: Duration) -> CatalogService {
        let mut manager = SourceManager::new();
        for source in sources {
            manager.insert(Arc::new(source));
        }

        let options = CatalogOptions {
            trust: [("a", 10), ("b", 20)].into_iter().collect(),
            provider_timeout: timeout,
            ..Default::default()
        };
        CatalogService::new(&manager, options).unwrap()
    }

    fn keys(report: &CatalogReport) -> Vec<String> {
        report.catalog.keys().map(|key| key.to_string()).collect()
    }

    #[tokio::test]
    async fn test_collect_merges_providers() {
        let a = MockSource::new("a").titled(&["Solo Leveling"]).chapters(&[
            ("Chapter 1", false),
            ("Chapter 2", false),
            ("Chapter 3", false),
            ("Chapter 3.5", false),
        ]);
        let b = MockSource::new("b").titled(&["Solo Leveling"]).chapters(&[
            ("Chapter 2", true),
            ("Chapter 3", false),
            ("Chapter 4", false),
        ]);

        let report = service(vec![a, b], Duration::from_secs(5))
            .collect("solo leveling", &[])
            .await
            .unwrap();

        assert_eq!(keys(&report), vec!["1", "2", "3", "3.5", "4"]);
        assert!(!report.partial);

        let two = report.catalog.get(&ChapterKey::from_integer(2)).unwrap();
        assert_eq!(two.winner.source_id, "a");
        assert!(two.alternates[0].locked);

        let four = report.catalog.get(&ChapterKey::from_integer(4)).unwrap();
        assert_eq!(four.winner.source_id, "b");
    }

    #[tokio::test]
    async fn test_one_provider_without_match_is_a_warning() {
        let a = MockSource::new("a");
        let b = MockSource::new("b").titled(&["Blinded by the Setting Sun"]);

        let resolution = service(vec![a, b], Duration::from_secs(5))
            .resolve_title("Blinded by the Setting Sun", &[])
            .await
            .unwrap();

        assert_eq!(resolution.title.name, "Blinded by the Setting Sun");
        assert_eq!(resolution.title.sources().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(resolution.failures.len(), 1);
        assert_eq!(resolution.failures[0].source_id, "a");
        assert_eq!(resolution.failures[0].stage, Stage::Resolve);
        assert_eq!(resolution.failures[0].error.kind(), "title_not_found");
    }

    #[tokio::test]
    async fn test_all_providers_failing_is_an_error() {
        let a = MockSource::new("a");
        let b = MockSource::new("b");

        let err = service(vec![a, b], Duration::from_secs(5))
            .collect("anything", &[])
            .await
            .unwrap_err();

        match err {
            CatalogError::AllProvidersFailed { failures } => assert_eq!(failures.len(), 2),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_sources() {
        let err = service(vec![], Duration::from_secs(5))
            .resolve_title("anything", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::NoSources));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_alone() {
        let a = MockSource::new("a")
            .titled(&["Omniscient Reader"])
            .slow(Duration::from_secs(30));
        let b = MockSource::new("b").titled(&["Omniscient Reader"]);

        let started = Instant::now();
        let resolution = service(vec![a, b], Duration::from_millis(200))
            .resolve_title("Omniscient Reader", &[])
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(resolution.title.sources().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(resolution.failures[0].source_id, "a");
        assert!(matches!(resolution.failures[0].error, ProviderError::TimedOut(_)));
    }

    #[tokio::test]
    async fn test_listing_failure_marks_catalog_partial() {
        let a = MockSource::new("a")
            .titled(&["Tower of God"])
            .listing_error(SourceError::Unavailable("503".to_string()));
        let b = MockSource::new("b")
            .titled(&["Tower of God"])
            .chapters(&[("Episode 1", false), ("Episode 2", false)]);

        let report = service(vec![a, b], Duration::from_secs(5))
            .collect("Tower of God", &[])
            .await
            .unwrap();

        assert!(report.partial);
        assert_eq!(keys(&report), vec!["1", "2"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, Stage::ListChapters);
        assert!(report.failures[0].error.is_retryable());
    }

    #[tokio::test]
    async fn test_incomplete_pagination_marks_catalog_partial() {
        let a = MockSource::new("a")
            .titled(&["Tower of God"])
            .chapters(&[("Episode 1", false)])
            .listing_status(PaginationStatus::incomplete(IncompleteReason::CapReached {
                cap: 3,
            }));

        let report = service(vec![a], Duration::from_secs(5))
            .collect("Tower of God", &[])
            .await
            .unwrap();

        assert!(report.partial);
        assert!(report.failures.is_empty());
        assert_eq!(report.incomplete.len(), 1);
        assert_eq!(report.incomplete[0].source_id, "a");
    }

    #[tokio::test]
    async fn test_ambiguous_title_is_surfaced() {
        let a = MockSource::new("a").titled(&["The Knighr", "The Kniggt"]);
        let b = MockSource::new("b");

        let err = service(vec![a, b], Duration::from_secs(5))
            .resolve_title("The Knight", &[])
            .await
            .unwrap_err();

        match err {
            CatalogError::AmbiguousTitle {
                candidates,
                failures,
            } => {
                assert_eq!(candidates.len(), 2);
                assert_eq!(failures.len(), 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unnumbered_chapters_stay_out_of_order() {
        let a = MockSource::new("a").titled(&["Vinland Saga"]).chapters(&[
            ("Chapter 2", false),
            ("Chapter Special", false),
            ("Chapter 1", false),
        ]);

        let report = service(vec![a], Duration::from_secs(5))
            .collect("Vinland Saga", &[])
            .await
            .unwrap();

        assert_eq!(keys(&report), vec!["1", "2"]);
        assert_eq!(report.catalog.unnumbered.len(), 1);
        assert_eq!(report.catalog.unnumbered[0].winner.label, "Chapter Special");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entries"][0]["key"], serde_json::json!(1.0));
        assert_eq!(json["entries"][0]["source_id"], "a");
        assert_eq!(json["unnumbered"][0]["label"], "Chapter Special");
        assert_eq!(json["partial"], false);
    }

    #[tokio::test]
    async fn test_fetch_pages_falls_back_to_alternates() {
        let a = MockSource::new("a")
            .titled(&["Berserk"])
            .chapters(&[("Chapter 1", false)])
            .pages(&["https://a.example/1.jpg"]);
        let b = MockSource::new("b")
            .titled(&["Berserk"])
            .chapters(&[("Chapter 1", false)]);

        let service = service(vec![a, b], Duration::from_secs(5));
        let report = service.collect("Berserk", &[]).await.unwrap();
        let entry = &report.catalog.entries[0];
        assert_eq!(entry.winner.source_id, "b");

        let pages = service.fetch_pages(entry).await.unwrap();
        assert_eq!(pages, vec!["https://a.example/1.jpg"]);
    }

    #[tokio::test]
    async fn test_fetch_pages_reports_last_error() {
        let a = MockSource::new("a")
            .titled(&["Berserk"])
            .chapters(&[("Chapter 1", false)]);

        let service = service(vec![a], Duration::from_secs(5));
        let report = service.collect("Berserk", &[]).await.unwrap();

        let err = service.fetch_pages(&report.catalog.entries[0]).await.unwrap_err();
        assert!(matches!(err, CatalogError::PagesUnavailable { .. }));
    }
}
