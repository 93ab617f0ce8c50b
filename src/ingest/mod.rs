//! Writer side: schema inference and bulk ingestion of tabular records

use tracing::{debug, info, warn};

use crate::engine::{BulkOperation, EngineClient, EngineError, FieldMapping, Mapping};
use crate::error::{Error, Result};
use crate::model::Fields;
use crate::tabular::Record;

/// Number of ingested records echoed back to the caller
pub const DEFAULT_PREVIEW_ROWS: usize = 6;

/// Mapping for a fresh index: every field full-text with a keyword sub-field.
pub fn infer_mapping<'a>(field_names: impl IntoIterator<Item = &'a str>) -> Result<Mapping> {
    let mapping = field_names
        .into_iter()
        .fold(Mapping::default(), |mapping, name| {
            mapping.with_field(name, FieldMapping::text_with_keyword())
        });
    if mapping.properties.is_empty() {
        return Err(Error::Schema("record has no fields".to_string()));
    }
    Ok(mapping)
}

/// Derives and creates the schema of an index from a representative record
pub struct SchemaInferencer<'a> {
    engine: &'a dyn EngineClient,
}

impl<'a> SchemaInferencer<'a> {
    pub fn new(engine: &'a dyn EngineClient) -> Self {
        Self { engine }
    }

    /// Create `index` with a mapping inferred from `record`.
    pub fn create_index(&self, index: &str, record: &Record) -> Result<Mapping> {
        let mapping = infer_mapping(record.keys().map(String::as_str))?;
        match self.engine.create_index(index, &mapping) {
            Ok(()) => {
                info!(index = %index, fields = mapping.properties.len(), "Created index");
            }
            // Another ingest won the race to create it
            Err(EngineError::IndexAlreadyExists(_)) => {
                debug!(index = %index, "Index already exists");
            }
            Err(err) => return Err(Error::Schema(err.to_string())),
        }
        Ok(mapping)
    }
}

/// Streams records into one index with a single bulk write
pub struct BulkIngestor<'a> {
    engine: &'a dyn EngineClient,
    preview_rows: usize,
}

impl<'a> BulkIngestor<'a> {
    pub fn new(engine: &'a dyn EngineClient) -> Self {
        Self {
            engine,
            preview_rows: DEFAULT_PREVIEW_ROWS,
        }
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    /// Ingest every record into `index`, returning the preview rows.
    ///
    /// The whole input is buffered before anything is written, so a parse
    /// error late in the file leaves the index untouched.
    pub fn ingest<I>(&self, index: &str, records: I) -> Result<Vec<Fields>>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        let records = records.into_iter().collect::<Result<Vec<Record>>>()?;
        let Some(first) = records.first() else {
            return Err(Error::EmptyInput);
        };

        if !self.engine.index_exists(index)? {
            SchemaInferencer::new(self.engine).create_index(index, first)?;
        }

        let operations: Vec<BulkOperation> = records
            .iter()
            .map(|record| BulkOperation::Index {
                index: index.to_string(),
                document: record.clone(),
            })
            .collect();

        let response = self.engine.bulk_write(&operations)?;
        if response.has_errors() {
            let reasons = response.error_reasons();
            warn!(
                index = %index,
                failed = reasons.len(),
                total = operations.len(),
                "Bulk write reported item errors"
            );
            for (position, item) in response.items.iter().enumerate() {
                if let Some(reason) = &item.error {
                    debug!(index = %index, position, reason = %reason, "Bulk item failed");
                }
            }
            return Err(Error::BulkWrite(reasons));
        }

        info!(index = %index, count = records.len(), "Ingested records");
        Ok(records.into_iter().take(self.preview_rows).collect())
    }
}
