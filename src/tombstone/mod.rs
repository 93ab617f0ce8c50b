//! Soft deletes: a boolean `deleted` flag instead of physical removal
//!
//! The flag field is added to an index's mapping lazily, the first time a
//! delete targets it. Searches exclude flagged documents (see `query`).

use serde_json::Value;
use tracing::{debug, info};

use crate::engine::{EngineClient, EngineError, FieldMapping, Mapping};
use crate::error::{Error, Result};
use crate::model::{Fields, DELETED_FIELD};

/// Ensures an index declares the deletion flag
pub struct SoftDeleteMigrator<'a> {
    engine: &'a dyn EngineClient,
}

impl<'a> SoftDeleteMigrator<'a> {
    pub fn new(engine: &'a dyn EngineClient) -> Self {
        Self { engine }
    }

    /// Add `deleted: boolean` to `index` unless already declared.
    ///
    /// Returns whether the mapping changed.
    pub fn migrate(&self, index: &str) -> Result<bool> {
        let mapping = self
            .engine
            .get_mapping(index)
            .map_err(|e| Error::Migration(e.to_string()))?;

        if mapping.contains(DELETED_FIELD) {
            debug!(index = %index, "Soft-delete field already mapped");
            return Ok(false);
        }

        let addition = Mapping::default().with_field(DELETED_FIELD, FieldMapping::boolean());
        self.engine
            .put_mapping(index, &addition)
            .map_err(|e| Error::Migration(e.to_string()))?;

        info!(index = %index, "Added soft-delete field");
        Ok(true)
    }
}

/// Flags documents as deleted
pub struct DeleteExecutor<'a> {
    engine: &'a dyn EngineClient,
}

impl<'a> DeleteExecutor<'a> {
    pub fn new(engine: &'a dyn EngineClient) -> Self {
        Self { engine }
    }

    /// Set `deleted = true` on (`index`, `id`). Repeating it is a no-op.
    pub fn delete(&self, index: &str, id: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(Error::Validation("Document id is required".to_string()));
        }

        let mut partial = Fields::new();
        partial.insert(DELETED_FIELD.to_string(), Value::Bool(true));

        match self.engine.update(index, id, &partial) {
            Ok(()) => {
                info!(index = %index, id = %id, "Document flagged as deleted");
                Ok(())
            }
            Err(EngineError::DocumentNotFound { .. }) => Err(Error::NotFound {
                index: index.to_string(),
                id: id.to_string(),
            }),
            Err(err) => Err(Error::Transport(err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BulkOperation, EmbeddedEngine, FieldType};
    use serde_json::json;
    use tempfile::TempDir;

    fn engine_with_row() -> (TempDir, EmbeddedEngine, String) {
        let dir = TempDir::new().unwrap();
        let engine = EmbeddedEngine::open(dir.path(), 50_000_000).unwrap();
        let mut document = Fields::new();
        document.insert("name".into(), json!("Herzl"));
        let response = engine
            .bulk_write(&[BulkOperation::Index {
                index: "streets".into(),
                document,
            }])
            .unwrap();
        let id = response.items[0].id.clone().unwrap();
        (dir, engine, id)
    }

    #[test]
    fn migration_is_idempotent() {
        let (_dir, engine, _) = engine_with_row();
        let migrator = SoftDeleteMigrator::new(&engine);

        assert!(migrator.migrate("streets").unwrap());
        assert!(!migrator.migrate("streets").unwrap());

        let mapping = engine.get_mapping("streets").unwrap();
        assert_eq!(mapping.properties[DELETED_FIELD].kind, FieldType::Boolean);
        assert!(mapping.contains("name"));
    }

    #[test]
    fn migrating_a_missing_index_fails() {
        let (_dir, engine, _) = engine_with_row();
        let err = SoftDeleteMigrator::new(&engine).migrate("nowhere").unwrap_err();
        assert!(matches!(err, Error::Migration(_)));
    }

    #[test]
    fn delete_sets_the_flag_and_repeats_cleanly() {
        let (_dir, engine, id) = engine_with_row();
        SoftDeleteMigrator::new(&engine).migrate("streets").unwrap();

        let executor = DeleteExecutor::new(&engine);
        executor.delete("streets", &id).unwrap();
        executor.delete("streets", &id).unwrap();

        assert_eq!(engine.list_indices().unwrap()[0].docs_count, 1);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let (_dir, engine, _) = engine_with_row();
        SoftDeleteMigrator::new(&engine).migrate("streets").unwrap();
        let err = DeleteExecutor::new(&engine)
            .delete("streets", "missing")
            .unwrap_err();
        assert_eq!(err.to_string(), "Document not found: streets/missing");
    }
}
