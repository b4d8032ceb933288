use serde::{Deserialize, Serialize};

/// A type represent source
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
    pub url: String,
    pub version: String,
}
