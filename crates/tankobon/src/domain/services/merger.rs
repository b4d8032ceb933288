use std::{
    cmp::{Ordering, Reverse},
    collections::{BTreeMap, HashSet},
    mem,
};

use tankobon_lib::prelude::*;

use crate::domain::{
    entities::{
        catalog::{Catalog, CatalogEntry, UnnumberedEntry},
        trust::TrustRanks,
    },
    services::normalizer::NormalizedListing,
};

/// Fields the winner policy looks at, shared by numbered and unnumbered chapters
trait Occurrence {
    fn source_id(&self) -> &str;
    fn url(&self) -> &str;
    fn label(&self) -> &str;
    fn locked(&self) -> bool;
    fn uploaded(&self) -> Option<i64>;
}

macro_rules! impl_occurrence {
    ($t:ty) => {
        impl Occurrence for $t {
            fn source_id(&self) -> &str {
                &self.source_id
            }
            fn url(&self) -> &str {
                &self.url
            }
            fn label(&self) -> &str {
                &self.label
            }
            fn locked(&self) -> bool {
                self.locked
            }
            fn uploaded(&self) -> Option<i64> {
                self.uploaded
            }
        }
    };
}

impl_occurrence!(NormalizedChapter);
impl_occurrence!(UnnumberedChapter);

/// Grouping key of an unnumbered chapter, case and whitespace insensitive
pub fn label_group(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Folds normalized listings into a [`Catalog`].
///
/// Within a chapter number the winner is an unlocked occurrence before a
/// locked one, then the most trusted provider, then provider id, url and
/// label. The order is total, so the catalog does not depend on the order
/// listings are merged in.
#[derive(Debug, Clone)]
pub struct CatalogMerger {
    trust: TrustRanks,
}

impl CatalogMerger {
    pub fn new(trust: TrustRanks) -> Self {
        Self { trust }
    }

    fn order<T: Occurrence>(&self, a: &T, b: &T) -> Ordering {
        a.locked()
            .cmp(&b.locked())
            .then_with(|| {
                Reverse(self.trust.rank(a.source_id())).cmp(&Reverse(self.trust.rank(b.source_id())))
            })
            .then_with(|| a.source_id().cmp(b.source_id()))
            .then_with(|| a.url().cmp(b.url()))
            .then_with(|| a.label().cmp(b.label()))
            .then_with(|| a.uploaded().cmp(&b.uploaded()))
    }

    /// Sorts occurrences into fallback order, keeping one per provider url
    fn rank<T: Occurrence>(&self, mut occurrences: Vec<T>) -> Vec<T> {
        occurrences.sort_by(|a, b| self.order(a, b));

        let mut seen = HashSet::new();
        occurrences.retain(|o| seen.insert((o.source_id().to_string(), o.url().to_string())));
        occurrences
    }

    pub fn merge(&self, catalog: &mut Catalog, listing: NormalizedListing) {
        let mut groups: BTreeMap<ChapterKey, Vec<NormalizedChapter>> = mem::take(&mut catalog.entries)
            .into_iter()
            .map(|entry| (entry.key, entry.into_occurrences()))
            .collect();
        for chapter in listing.chapters {
            groups.entry(chapter.key).or_default().push(chapter);
        }

        catalog.entries = groups
            .into_iter()
            .filter_map(|(key, occurrences)| {
                let mut ranked = self.rank(occurrences).into_iter();
                let winner = ranked.next()?;
                Some(CatalogEntry {
                    key,
                    winner,
                    alternates: ranked.collect(),
                })
            })
            .collect();

        let mut groups: BTreeMap<String, Vec<UnnumberedChapter>> = mem::take(&mut catalog.unnumbered)
            .into_iter()
            .map(|entry| (entry.group.clone(), entry.into_occurrences()))
            .collect();
        for chapter in listing.unnumbered {
            groups.entry(label_group(&chapter.label)).or_default().push(chapter);
        }

        catalog.unnumbered = groups
            .into_iter()
            .filter_map(|(group, occurrences)| {
                let mut ranked = self.rank(occurrences).into_iter();
                let winner = ranked.next()?;
                Some(UnnumberedEntry {
                    group,
                    winner,
                    alternates: ranked.collect(),
                })
            })
            .collect();
    }

    pub fn merge_all(&self, listings: impl IntoIterator<Item = NormalizedListing>) -> Catalog {
        let mut catalog = Catalog::default();
        for listing in listings {
            self.merge(&mut catalog, listing);
        }

        catalog
    }
}
