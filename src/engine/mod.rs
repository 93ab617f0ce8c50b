//! The engine seam: everything the core needs from a document search engine
//!
//! Two implementations live here:
//! - `EmbeddedEngine`: tantivy indices on local disk
//! - `ElasticEngine`: an Elasticsearch cluster over its REST API
//!
//! Components receive a `&dyn EngineClient`, so tests can hand them either
//! engine (or a temp-dir embedded one) without any global client.

pub mod elastic;
pub mod embedded;
pub mod mapping;

use serde::Serialize;

use crate::model::{Fields, SearchTarget};
use crate::query::QueryNode;

pub use elastic::ElasticEngine;
pub use embedded::EmbeddedEngine;
pub use mapping::{FieldMapping, FieldType, Mapping};

/// Result type for engine calls
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Failures reported by (or while talking to) the engine
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Engine unreachable or returned an unexpected response
    #[error("Engine transport error: {0}")]
    Transport(String),

    #[error("no such index [{0}]")]
    IndexNotFound(String),

    #[error("index [{0}] already exists")]
    IndexAlreadyExists(String),

    #[error("document [{id}] missing in index [{index}]")]
    DocumentNotFound { index: String, id: String },

    /// Engine understood the request and refused it
    #[error("{0}")]
    Rejected(String),

    #[error("Invalid index name [{name}]: {reason}")]
    InvalidIndexName { name: String, reason: String },

    /// Local storage failure (embedded engine)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<tantivy::TantivyError> for EngineError {
    fn from(err: tantivy::TantivyError) -> Self {
        EngineError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Storage(format!("malformed JSON: {err}"))
    }
}

/// Engine name and version, as reported by a connectivity check
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    pub name: String,
    pub version: String,
}

/// One action of a bulk request
#[derive(Debug, Clone)]
pub enum BulkOperation {
    /// Insert `document` into `index` under a generated id
    Index { index: String, document: Fields },
}

/// Per-item outcome of a bulk request, in request order
#[derive(Debug, Clone, Default)]
pub struct BulkItem {
    pub index: String,
    pub id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BulkResponse {
    pub items: Vec<BulkItem>,
}

impl BulkResponse {
    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|item| item.error.is_some())
    }

    /// Reasons of every failed item, in request order
    pub fn error_reasons(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| item.error.clone())
            .collect()
    }
}

/// A raw engine hit
#[derive(Debug, Clone)]
pub struct Hit {
    pub id: String,
    pub index: String,
    pub score: f32,
    pub source: Fields,
}

#[derive(Debug, Clone, Default)]
pub struct SearchHits {
    /// Total matches, independent of how many hits were returned
    pub total: u64,
    pub hits: Vec<Hit>,
}

/// Index listing row
#[derive(Debug, Clone, PartialEq)]
pub struct IndexInfo {
    pub name: String,
    pub docs_count: u64,
    pub store_size: String,
}

/// Operations the core issues against a search engine
pub trait EngineClient: Send + Sync {
    /// Connectivity check
    fn info(&self) -> EngineResult<EngineInfo>;

    fn index_exists(&self, index: &str) -> EngineResult<bool>;

    /// Create `index` with `mapping`; fails with `IndexAlreadyExists` if present.
    fn create_index(&self, index: &str, mapping: &Mapping) -> EngineResult<()>;

    fn get_mapping(&self, index: &str) -> EngineResult<Mapping>;

    /// Additive mapping update
    fn put_mapping(&self, index: &str, mapping: &Mapping) -> EngineResult<()>;

    fn bulk_write(&self, operations: &[BulkOperation]) -> EngineResult<BulkResponse>;

    /// Run `query` against `target`, returning at most `size` hits.
    fn search(&self, target: &SearchTarget, query: &QueryNode, size: usize)
        -> EngineResult<SearchHits>;

    /// Partial update: merge `partial` into the stored document.
    fn update(&self, index: &str, id: &str, partial: &Fields) -> EngineResult<()>;

    /// Physical removal. The core never calls this; soft deletes go through `update`.
    fn delete(&self, index: &str, id: &str) -> EngineResult<()>;

    fn list_indices(&self) -> EngineResult<Vec<IndexInfo>>;
}

/// Format a byte count the way `_cat/indices` does (`225b`, `4.2kb`, `1.1mb`).
pub fn format_store_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["kb", "mb", "gb", "tb"];
    if bytes < 1024 {
        return format!("{bytes}b");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}
