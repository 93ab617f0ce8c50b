//! Request and response types shared by the core and its callers
//!
//! Envelopes serialize to the wire shape callers bind to: `results`,
//! `total`, `error` for searches, `indexName` for ingestion outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Ordered field name → value map (source order is preserved)
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Name of the boolean tombstone field added by the soft-delete migration
pub const DELETED_FIELD: &str = "deleted";

/// Wildcard target meaning "every index"
pub const ALL_INDICES: &str = "*";

/// How a query string is turned into a match clause
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Fuzzy any-field match combined with phrase-prefix completion
    #[default]
    Free,
    /// Every whitespace-separated term must match as a quoted fragment
    Accurate,
    /// The whole query must match as one contiguous phrase
    Phrase,
}

impl SearchMode {
    /// Parse a mode name; anything unrecognized (or absent) is `Free`.
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("accurate") => SearchMode::Accurate,
            Some("phrase") => SearchMode::Phrase,
            Some("free") | None => SearchMode::Free,
            Some(other) => {
                tracing::debug!(mode = other, "Unknown search mode, using free");
                SearchMode::Free
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Free => "free",
            SearchMode::Accurate => "accurate",
            SearchMode::Phrase => "phrase",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which indices a search runs against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SearchTarget {
    #[default]
    All,
    Index(String),
}

impl SearchTarget {
    /// `None`, empty, or `*` mean all indices.
    pub fn from_option(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            None | Some("") | Some(ALL_INDICES) => SearchTarget::All,
            Some(name) => SearchTarget::Index(name.to_string()),
        }
    }

    /// Path segment understood by the engine
    pub fn as_path(&self) -> &str {
        match self {
            SearchTarget::All => ALL_INDICES,
            SearchTarget::Index(name) => name,
        }
    }
}

/// A validated search request
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub mode: SearchMode,
    pub target: SearchTarget,
}

impl SearchRequest {
    /// Build a request, rejecting queries that are blank after trimming.
    pub fn new(query: &str, mode: SearchMode, target: SearchTarget) -> Result<Self> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("Query is required".to_string()));
        }
        Ok(Self {
            query: query.to_string(),
            mode,
            target,
        })
    }
}

/// One document in a search envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: String,
    pub index: String,
    pub fields: Fields,
}

/// Uniform result of a search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchEnvelope {
    pub results: Vec<SearchDocument>,
    pub total: u64,
    pub error: Option<String>,
}

impl SearchEnvelope {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            total: 0,
            error: Some(message.into()),
        }
    }
}

/// Summary row for one index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub name: String,
    pub docs_count: u64,
    pub size: String,
}

/// Result of listing indices
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndicesEnvelope {
    pub results: Vec<IndexSummary>,
    pub error: Option<String>,
}

/// Result of a delete (or migration) call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl DeleteOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Result of ingesting tabular data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionOutcome {
    pub index_name: Option<String>,
    pub results: Vec<Fields>,
    pub error: Option<String>,
}

impl IngestionOutcome {
    pub fn failed(index_name: Option<String>, message: impl Into<String>) -> Self {
        Self {
            index_name,
            results: Vec::new(),
            error: Some(message.into()),
        }
    }
}
