//! Error taxonomy for the query, ingestion and soft-delete core
//!
//! Engine-level failures are typed separately (`engine::EngineError`) and
//! folded into these kinds at the component boundary. Public operations on
//! `Service` never return these; they render them into envelopes.

use crate::engine::EngineError;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the core components
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller input fault (empty query, missing identifiers)
    #[error("{0}")]
    Validation(String),

    /// Index schema could not be inferred or created
    #[error("Schema error: {0}")]
    Schema(String),

    /// Soft-delete mapping update was rejected
    #[error("Migration failed: {0}")]
    Migration(String),

    /// The tabular input produced no records
    #[error("No records found in CSV")]
    EmptyInput,

    /// Engine reported per-item failures in a bulk write
    #[error("Indexing errors: {}", .0.join(", "))]
    BulkWrite(Vec<String>),

    /// Engine unreachable or internal engine fault
    #[error("{0}")]
    Transport(String),

    /// Delete target does not exist
    #[error("Document not found: {index}/{id}")]
    NotFound { index: String, id: String },

    /// Malformed tabular input
    #[error("Invalid CSV format: {0}")]
    Parse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<EngineError> for Error {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::DocumentNotFound { index, id } => Error::NotFound { index, id },
            other => Error::Transport(other.to_string()),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_write_joins_reasons() {
        let err = Error::BulkWrite(vec!["bad a".into(), "bad b".into()]);
        assert_eq!(err.to_string(), "Indexing errors: bad a, bad b");
    }

    #[test]
    fn missing_document_maps_to_not_found() {
        let err: Error = EngineError::DocumentNotFound {
            index: "people".into(),
            id: "42".into(),
        }
        .into();
        assert!(matches!(err, Error::NotFound { ref id, .. } if id == "42"));
    }
}
