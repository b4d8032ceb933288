use serde::{Deserialize, Serialize};

use crate::{models::ChapterKey, pagination::PaginationStatus};

/// A chapter as listed by a source, before any interpretation of its label
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RawChapterRecord {
    pub source_id: String,
    /// Label as shown by the provider, e.g. "Chapter 123.5"
    pub label: String,
    pub url: String,
    /// Unix timestamp in seconds
    pub uploaded: Option<i64>,
    /// Listed but not readable on this source (app exclusive, premium, external)
    #[serde(default)]
    pub locked: bool,
}

/// Every record a source listed for a title, in provider order
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChapterListing {
    pub records: Vec<RawChapterRecord>,
    pub pagination: PaginationStatus,
}

impl ChapterListing {
    pub fn complete(records: Vec<RawChapterRecord>) -> Self {
        Self {
            records,
            pagination: PaginationStatus::Complete,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pagination.is_complete()
    }
}

/// A chapter with a canonical number
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NormalizedChapter {
    pub key: ChapterKey,
    pub label: String,
    pub source_id: String,
    pub url: String,
    pub locked: bool,
    pub uploaded: Option<i64>,
}

/// A chapter whose label carries no usable number
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UnnumberedChapter {
    pub label: String,
    pub source_id: String,
    pub url: String,
    pub locked: bool,
    pub uploaded: Option<i64>,
}

impl From<RawChapterRecord> for UnnumberedChapter {
    fn from(record: RawChapterRecord) -> Self {
        Self {
            label: record.label,
            source_id: record.source_id,
            url: record.url,
            locked: record.locked,
            uploaded: record.uploaded,
        }
    }
}

impl NormalizedChapter {
    pub fn from_record(record: RawChapterRecord, key: ChapterKey) -> Self {
        Self {
            key,
            label: record.label,
            source_id: record.source_id,
            url: record.url,
            locked: record.locked,
            uploaded: record.uploaded,
        }
    }
}
