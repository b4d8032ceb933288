use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Configured trust rank per provider id, higher wins. Unknown providers rank 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TrustRanks(BTreeMap<String, i32>);

impl TrustRanks {
    pub fn new(ranks: BTreeMap<String, i32>) -> Self {
        Self(ranks)
    }

    pub fn rank(&self, source_id: &str) -> i32 {
        self.0.get(source_id).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(id, rank)| (id.as_str(), *rank))
    }
}

impl<S: Into<String>> FromIterator<(S, i32)> for TrustRanks {
    fn from_iter<I: IntoIterator<Item = (S, i32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(id, rank)| (id.into(), rank)).collect())
    }
}
