use std::sync::Arc;

use fnv::FnvHashMap;
use tankobon_lib::prelude::*;

use crate::{arenascans, fetch::HttpClient, mangadex, mangapill, webtoon};

/// Every provider id this crate ships an adapter for
pub const BUILTIN_SOURCES: [&str; 4] = [mangadex::ID, mangapill::ID, webtoon::ID, arenascans::ID];

/// Registry of the adapters a session queries, keyed by provider id
#[derive(Default)]
pub struct SourceManager {
    sources: FnvHashMap<String, Arc<dyn Source>>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the built in adapters named in `enabled`, all sharing `client`
    pub fn with_builtin(
        client: Arc<HttpClient>,
        language: &str,
        pagination: &PaginationConfig,
        enabled: &[String],
    ) -> SourceResult<Self> {
        let mut manager = Self::new();
        for id in enabled {
            let source: Arc<dyn Source> = match id.as_str() {
                mangadex::ID => Arc::new(mangadex::MangaDex::new(
                    client.clone(),
                    language,
                    pagination.clone(),
                )),
                mangapill::ID => Arc::new(mangapill::MangaPill::new(client.clone())),
                webtoon::ID => Arc::new(webtoon::Webtoon::new(client.clone(), pagination.clone())?),
                arenascans::ID => Arc::new(arenascans::ArenaScans::new(client.clone())?),
                other => {
                    return Err(SourceError::Unsupported(format!(
                        "unknown source {other:?}, expected one of {}",
                        BUILTIN_SOURCES.join(", ")
                    )));
                }
            };
            manager.insert(source);
        }

        Ok(manager)
    }

    pub fn insert(&mut self, source: Arc<dyn Source>) -> Option<Arc<dyn Source>> {
        let id = source.source_info().id;
        debug!("registering source {id}");
        self.sources.insert(id, source)
    }

    pub fn unload(&mut self, id: &str) -> SourceResult<Arc<dyn Source>> {
        self.sources
            .remove(id)
            .ok_or_else(|| SourceError::Unsupported(format!("no such source {id}")))
    }

    pub fn get(&self, id: &str) -> SourceResult<Arc<dyn Source>> {
        self.sources
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::Unsupported(format!("source {id} not registered")))
    }

    /// Registered sources ordered by id
    pub fn all(&self) -> Vec<Arc<dyn Source>> {
        let mut sources: Vec<_> = self.sources.values().cloned().collect();
        sources.sort_by_cached_key(|source| source.source_info().id);
        sources
    }

    pub fn list(&self) -> Vec<SourceInfo> {
        self.all().iter().map(|source| source.source_info()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
