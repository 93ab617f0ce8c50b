//! Reader side: run built queries and shape engine hits into envelopes

use tracing::{debug, warn};

use crate::engine::{EngineClient, Hit};
use crate::error::Result;
use crate::model::{
    IndexSummary, IndicesEnvelope, SearchDocument, SearchEnvelope, SearchRequest, DELETED_FIELD,
};
use crate::query::build_query;

/// Upper bound on documents returned by one search
pub const DEFAULT_MAX_RESULTS: usize = 100;

pub struct SearchExecutor<'a> {
    engine: &'a dyn EngineClient,
    max_results: usize,
}

impl<'a> SearchExecutor<'a> {
    pub fn new(engine: &'a dyn EngineClient) -> Self {
        Self {
            engine,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Run `request`; failures come back as an envelope with `error` set.
    pub fn execute(&self, request: &SearchRequest) -> SearchEnvelope {
        match self.try_execute(request) {
            Ok(envelope) => envelope,
            Err(err) => {
                warn!(query = %request.query, error = %err, "Search failed");
                SearchEnvelope::failed(format!("Search failed: {err}"))
            }
        }
    }

    fn try_execute(&self, request: &SearchRequest) -> Result<SearchEnvelope> {
        let query = build_query(&request.query, request.mode);
        debug!(
            query = %request.query,
            mode = %request.mode,
            target = request.target.as_path(),
            "Executing search"
        );

        let hits = self
            .engine
            .search(&request.target, &query, self.max_results)?;

        let results: Vec<SearchDocument> = hits
            .hits
            .into_iter()
            .take(self.max_results)
            .map(to_document)
            .collect();

        debug!(returned = results.len(), total = hits.total, "Search complete");
        Ok(SearchEnvelope {
            results,
            total: hits.total,
            error: None,
        })
    }

    /// Every index with its live document count and stored size.
    pub fn list_indices(&self) -> IndicesEnvelope {
        match self.engine.list_indices() {
            Ok(indices) => IndicesEnvelope {
                results: indices
                    .into_iter()
                    .map(|info| IndexSummary {
                        name: info.name,
                        docs_count: info.docs_count,
                        size: info.store_size,
                    })
                    .collect(),
                error: None,
            },
            Err(err) => {
                warn!(error = %err, "Listing indices failed");
                IndicesEnvelope {
                    results: Vec::new(),
                    error: Some(format!("Failed to list indices: {err}")),
                }
            }
        }
    }
}

/// Drop bookkeeping fields and keep the rest in source order.
fn to_document(hit: Hit) -> SearchDocument {
    let mut fields = hit.source;
    fields.remove(DELETED_FIELD);
    SearchDocument {
        id: hit.id,
        index: hit.index,
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BulkOperation, EmbeddedEngine};
    use crate::model::{Fields, SearchMode, SearchTarget};
    use serde_json::json;
    use tempfile::TempDir;

    fn seeded(rows: usize) -> (TempDir, EmbeddedEngine) {
        let dir = TempDir::new().unwrap();
        let engine = EmbeddedEngine::open(dir.path(), 50_000_000).unwrap();
        let operations: Vec<BulkOperation> = (0..rows)
            .map(|i| {
                let mut document = Fields::new();
                document.insert("street".into(), json!(format!("Herzl {i}")));
                document.insert("deleted".into(), json!(false));
                BulkOperation::Index {
                    index: "streets".into(),
                    document,
                }
            })
            .collect();
        engine.bulk_write(&operations).unwrap();
        (dir, engine)
    }

    fn request(query: &str, target: SearchTarget) -> SearchRequest {
        SearchRequest::new(query, SearchMode::Free, target).unwrap()
    }

    #[test]
    fn caps_results_but_reports_full_total() {
        let (_dir, engine) = seeded(5);
        let envelope = SearchExecutor::new(&engine)
            .with_max_results(3)
            .execute(&request("Herzl", SearchTarget::All));
        assert!(envelope.error.is_none());
        assert_eq!(envelope.results.len(), 3);
        assert_eq!(envelope.total, 5);
    }

    #[test]
    fn strips_the_tombstone_field() {
        let (_dir, engine) = seeded(1);
        let envelope = SearchExecutor::new(&engine).execute(&request("Herzl", SearchTarget::All));
        let document = &envelope.results[0];
        assert_eq!(document.index, "streets");
        assert!(!document.id.is_empty());
        assert!(!document.fields.contains_key(DELETED_FIELD));
        assert_eq!(document.fields["street"], "Herzl 0");
    }

    #[test]
    fn failures_become_error_envelopes() {
        let (_dir, engine) = seeded(1);
        let envelope = SearchExecutor::new(&engine)
            .execute(&request("Herzl", SearchTarget::Index("nowhere".into())));
        assert!(envelope.results.is_empty());
        assert_eq!(envelope.total, 0);
        assert!(envelope
            .error
            .as_deref()
            .unwrap()
            .starts_with("Search failed: "));
    }

    #[test]
    fn lists_indices_with_counts() {
        let (_dir, engine) = seeded(4);
        let envelope = SearchExecutor::new(&engine).list_indices();
        assert!(envelope.error.is_none());
        assert_eq!(envelope.results.len(), 1);
        assert_eq!(envelope.results[0].name, "streets");
        assert_eq!(envelope.results[0].docs_count, 4);
    }
}
