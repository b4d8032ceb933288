use serde::Serialize;
use tankobon_lib::prelude::{ChapterKey, NormalizedChapter, UnnumberedChapter};

/// One chapter number and every provider occurrence of it
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CatalogEntry {
    #[serde(skip)]
    pub key: ChapterKey,
    /// Occurrence readers are sent to first
    #[serde(flatten)]
    pub winner: NormalizedChapter,
    /// Remaining occurrences in fallback order
    pub alternates: Vec<NormalizedChapter>,
}

impl CatalogEntry {
    /// Winner first, then alternates
    pub fn occurrences(&self) -> impl Iterator<Item = &NormalizedChapter> {
        std::iter::once(&self.winner).chain(self.alternates.iter())
    }

    pub fn into_occurrences(self) -> Vec<NormalizedChapter> {
        let mut occurrences = Vec::with_capacity(self.alternates.len() + 1);
        occurrences.push(self.winner);
        occurrences.extend(self.alternates);
        occurrences
    }

    pub fn is_locked(&self) -> bool {
        self.winner.locked
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.occurrences().map(|chapter| chapter.source_id.as_str())
    }
}

/// Chapters sharing a normalised label that carries no number
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UnnumberedEntry {
    #[serde(skip)]
    pub group: String,
    #[serde(flatten)]
    pub winner: UnnumberedChapter,
    pub alternates: Vec<UnnumberedChapter>,
}

impl UnnumberedEntry {
    pub fn into_occurrences(self) -> Vec<UnnumberedChapter> {
        let mut occurrences = Vec::with_capacity(self.alternates.len() + 1);
        occurrences.push(self.winner);
        occurrences.extend(self.alternates);
        occurrences
    }
}

/// Chapters of one title across providers.
///
/// `entries` is strictly increasing by key, one entry per key.
/// `unnumbered` is ordered by group label.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
    pub unnumbered: Vec<UnnumberedEntry>,
}

impl Catalog {
    pub fn get(&self, key: &ChapterKey) -> Option<&CatalogEntry> {
        self.entries
            .binary_search_by(|entry| entry.key.cmp(key))
            .ok()
            .map(|i| &self.entries[i])
    }

    pub fn keys(&self) -> impl Iterator<Item = &ChapterKey> {
        self.entries.iter().map(|entry| &entry.key)
    }

    /// Highest numbered chapter a reader can open
    pub fn latest_readable(&self) -> Option<&CatalogEntry> {
        self.entries.iter().rev().find(|entry| !entry.is_locked())
    }

    pub fn locked_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_locked()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.unnumbered.is_empty()
    }
}
