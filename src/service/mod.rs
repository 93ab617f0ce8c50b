//! The public operations: search, list indices, delete, ingest
//!
//! Every operation returns a serializable envelope; failures are rendered
//! into its `error` field instead of being returned as `Err`.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

use crate::config::Settings;
use crate::engine::{EngineClient, EngineInfo};
use crate::error::{Error, Result};
use crate::ingest::BulkIngestor;
use crate::model::{
    DeleteOutcome, IndicesEnvelope, IngestionOutcome, SearchEnvelope, SearchMode, SearchRequest,
    SearchTarget,
};
use crate::search::SearchExecutor;
use crate::tabular::TabularParser;
use crate::tombstone::{DeleteExecutor, SoftDeleteMigrator};

#[derive(Clone)]
pub struct Service {
    engine: Arc<dyn EngineClient>,
    settings: Settings,
}

impl Service {
    pub fn new(engine: Arc<dyn EngineClient>, settings: Settings) -> Self {
        Self { engine, settings }
    }

    /// Search `target` (all indices when `None`). Unknown modes mean `free`.
    pub fn search(&self, query: &str, mode: Option<&str>, target: Option<&str>) -> SearchEnvelope {
        let request = match SearchRequest::new(
            query,
            SearchMode::parse_lenient(mode),
            SearchTarget::from_option(target),
        ) {
            Ok(request) => request,
            Err(err) => return SearchEnvelope::failed(err.to_string()),
        };

        SearchExecutor::new(self.engine.as_ref())
            .with_max_results(self.settings.search.max_results)
            .execute(&request)
    }

    pub fn list_indices(&self) -> IndicesEnvelope {
        SearchExecutor::new(self.engine.as_ref()).list_indices()
    }

    /// Soft-delete one document, migrating its index first if needed.
    pub fn delete_document(&self, index: &str, id: &str) -> DeleteOutcome {
        match self.try_delete(index, id) {
            Ok(()) => DeleteOutcome::ok(),
            Err(err) => {
                warn!(index = %index, id = %id, error = %err, "Delete failed");
                DeleteOutcome::failed(format!("Failed to delete record: {err}"))
            }
        }
    }

    fn try_delete(&self, index: &str, id: &str) -> Result<()> {
        if index.trim().is_empty() {
            return Err(Error::Validation("Index name is required".to_string()));
        }
        // Reject before the migrator touches the mapping
        if id.trim().is_empty() {
            return Err(Error::Validation("Document id is required".to_string()));
        }
        SoftDeleteMigrator::new(self.engine.as_ref()).migrate(index)?;
        DeleteExecutor::new(self.engine.as_ref()).delete(index, id)
    }

    /// Add the soft-delete field to `index` ahead of any delete.
    pub fn migrate(&self, index: &str) -> DeleteOutcome {
        match SoftDeleteMigrator::new(self.engine.as_ref()).migrate(index) {
            Ok(_) => DeleteOutcome::ok(),
            Err(err) => DeleteOutcome::failed(err.to_string()),
        }
    }

    /// Ingest CSV `bytes` into the index named by `label` (lower-cased).
    pub fn ingest(&self, bytes: &[u8], label: Option<&str>) -> IngestionOutcome {
        let index = index_name(label);
        info!(index = %index, bytes = bytes.len(), "Ingesting CSV");

        match self.try_ingest(&index, bytes) {
            Ok(results) => IngestionOutcome {
                index_name: Some(index),
                results,
                error: None,
            },
            Err(err @ (Error::EmptyInput | Error::BulkWrite(_))) => {
                IngestionOutcome::failed(Some(index), err.to_string())
            }
            Err(err) => {
                warn!(index = %index, error = %err, "Ingest failed");
                IngestionOutcome::failed(None, format!("Failed to process CSV: {err}"))
            }
        }
    }

    fn try_ingest(&self, index: &str, bytes: &[u8]) -> Result<Vec<crate::model::Fields>> {
        let parser = self.parser()?;
        let records = parser.records(bytes)?;
        BulkIngestor::new(self.engine.as_ref())
            .with_preview_rows(self.settings.ingest.preview_rows)
            .ingest(index, records)
    }

    /// Check that `bytes` is well-formed CSV with at least one record.
    pub fn validate(&self, bytes: &[u8]) -> Result<()> {
        self.parser()?.validate(bytes)
    }

    /// Engine name and version
    pub fn engine_info(&self) -> Result<EngineInfo> {
        Ok(self.engine.info()?)
    }

    fn parser(&self) -> Result<TabularParser> {
        let ingest = &self.settings.ingest;
        Ok(TabularParser::new(ingest.delimiter_byte()?, ingest.has_headers))
    }
}

/// Index name for an upload: its label lower-cased, or `csv_<unix millis>`.
pub fn index_name(label: Option<&str>) -> String {
    match label.map(str::trim).filter(|l| !l.is_empty()) {
        Some(label) => label.to_lowercase(),
        None => {
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or_default();
            format!("csv_{millis}")
        }
    }
}
