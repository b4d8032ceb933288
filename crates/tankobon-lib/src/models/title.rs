use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One search hit returned by a source
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TitleCandidate {
    pub source_id: String,
    /// Provider-side identifier (numeric id, uuid or slug)
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub alt_titles: Vec<String>,
}

/// The candidate a source resolved a query to
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TitleMatch {
    pub source_id: String,
    pub id: String,
    pub title: String,
    pub url: String,
    pub similarity: f64,
}

impl TitleMatch {
    pub fn from_candidate(candidate: TitleCandidate, similarity: f64) -> Self {
        Self {
            source_id: candidate.source_id,
            id: candidate.id,
            title: candidate.title,
            url: candidate.url,
            similarity,
        }
    }
}

/// A series resolved across every source that knows it
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Title {
    pub query: String,
    pub aliases: Vec<String>,
    /// Display name, taken from the most trusted source's match
    pub name: String,
    /// Source id to the match on that source
    pub ids: BTreeMap<String, TitleMatch>,
}

impl Title {
    pub fn get(&self, source_id: &str) -> Option<&TitleMatch> {
        self.ids.get(source_id)
    }

    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.ids.keys().map(String::as_str)
    }
}
