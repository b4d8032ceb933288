use std::cmp::Ordering;

use itertools::Itertools;
use tankobon_lib::prelude::*;
use thiserror::Error;

use crate::domain::entities::trust::TrustRanks;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    #[error("title not found: {0}")]
    TitleNotFound(String),
    #[error("ambiguous title, candidates: {}", candidate_titles(.candidates))]
    AmbiguousTitle { candidates: Vec<TitleMatch> },
    #[error(transparent)]
    Source(#[from] SourceError),
}

fn candidate_titles(candidates: &[TitleMatch]) -> String {
    candidates
        .iter()
        .map(|c| format!("{:?} ({}:{})", c.title, c.source_id, c.id))
        .join(", ")
}

/// Lowercase, punctuation dropped, whitespace collapsed
pub fn normalize_title(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .join(" ")
}

/// `name` contains the whole `probe`, or `probe` contains `name` as whole
/// words making up at least half of it
fn related(probe: &str, name: &str) -> bool {
    if name.contains(probe) {
        return true;
    }

    name.chars().count() * 2 >= probe.chars().count()
        && format!(" {probe} ").contains(&format!(" {name} "))
}

#[derive(Debug)]
struct Scored {
    candidate: TitleCandidate,
    score: f64,
    substring: bool,
    distance: usize,
    exact_query: bool,
    exact_alias: bool,
}

impl Scored {
    fn rank(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.substring.cmp(&self.substring))
            .then_with(|| self.distance.cmp(&other.distance))
            .then_with(|| self.candidate.id.cmp(&other.candidate.id))
    }

    fn into_match(self) -> TitleMatch {
        TitleMatch::from_candidate(self.candidate, self.score)
    }
}

/// Picks each provider's candidate for a query and assembles the [`Title`]
#[derive(Debug, Clone)]
pub struct TitleResolver {
    tolerance: f64,
    min_similarity: f64,
    trust: TrustRanks,
}

impl TitleResolver {
    pub fn new(tolerance: f64, min_similarity: f64, trust: TrustRanks) -> Self {
        Self {
            tolerance,
            min_similarity,
            trust,
        }
    }

    fn score(&self, query: &str, aliases: &[String], candidate: TitleCandidate) -> Scored {
        let query = normalize_title(query);
        let aliases: Vec<String> = aliases.iter().map(|a| normalize_title(a)).collect();
        let names: Vec<String> = std::iter::once(&candidate.title)
            .chain(candidate.alt_titles.iter())
            .map(|name| normalize_title(name))
            .filter(|name| !name.is_empty())
            .collect();

        let probes = std::iter::once(&query)
            .chain(aliases.iter())
            .filter(|probe| !probe.is_empty());

        let mut scored = Scored {
            candidate,
            score: 0.0,
            substring: false,
            distance: usize::MAX,
            exact_query: false,
            exact_alias: false,
        };
        for (probe, name) in probes.cartesian_product(names.iter()) {
            scored.score = scored.score.max(strsim::normalized_levenshtein(probe, name));
            scored.distance = scored.distance.min(strsim::levenshtein(probe, name));
            scored.substring |= related(probe, name);
            if probe == name {
                if *probe == query {
                    scored.exact_query = true;
                } else {
                    scored.exact_alias = true;
                }
            }
        }

        scored
    }

    /// Chooses the candidate one provider returned for `query`
    pub fn select(
        &self,
        query: &str,
        aliases: &[String],
        candidates: Vec<TitleCandidate>,
    ) -> Result<TitleMatch, ResolveError> {
        let mut scored: Vec<Scored> = candidates
            .into_iter()
            .map(|candidate| self.score(query, aliases, candidate))
            .filter(|s| s.score >= self.min_similarity || s.substring)
            .collect();
        scored.sort_by(Scored::rank);

        if scored.is_empty() {
            return Err(ResolveError::TitleNotFound(format!(
                "no candidate close enough to {query:?}"
            )));
        }

        let exact: Vec<usize> = scored
            .iter()
            .positions(|s| s.exact_query || s.exact_alias)
            .collect();
        if let [only] = exact[..] {
            return Ok(scored.swap_remove(only).into_match());
        }
        let exact_query: Vec<usize> = scored.iter().positions(|s| s.exact_query).collect();
        if let [only] = exact_query[..] {
            return Ok(scored.swap_remove(only).into_match());
        }

        let within_band = scored
            .get(1)
            .is_some_and(|second| scored[0].score - second.score <= self.tolerance);
        if !within_band {
            return Ok(scored.swap_remove(0).into_match());
        }

        let (first, second) = (&scored[0], &scored[1]);
        if first.exact_alias != second.exact_alias {
            let pick = if first.exact_alias { 0 } else { 1 };
            return Ok(scored.swap_remove(pick).into_match());
        }
        if first.substring != second.substring {
            let pick = if first.substring { 0 } else { 1 };
            return Ok(scored.swap_remove(pick).into_match());
        }

        let top = scored[0].score;
        let candidates = scored
            .into_iter()
            .take_while(|s| top - s.score <= self.tolerance)
            .map(Scored::into_match)
            .collect();

        Err(ResolveError::AmbiguousTitle { candidates })
    }

    /// Builds the title from every provider that resolved it. `None` when no
    /// provider did.
    pub fn assemble(&self, query: &str, aliases: &[String], matches: Vec<TitleMatch>) -> Option<Title> {
        let name = matches
            .iter()
            .max_by(|a, b| {
                self.trust
                    .rank(&a.source_id)
                    .cmp(&self.trust.rank(&b.source_id))
                    .then_with(|| b.source_id.cmp(&a.source_id))
            })?
            .title
            .clone();

        Some(Title {
            query: query.to_string(),
            aliases: aliases.to_vec(),
            name,
            ids: matches
                .into_iter()
                .map(|m| (m.source_id.clone(), m))
                .collect(),
        })
    }
}
