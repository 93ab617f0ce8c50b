//! Embedded engine: one tantivy index per logical index, on local disk
//!
//! Layout under the data directory:
//!
//! ```text
//! <data_dir>/
//!   streets/
//!     mapping.json   authoritative mapping (Elasticsearch shape)
//!     meta.json ...  tantivy files
//! ```
//!
//! Tantivy schemas are immutable, so an additive mapping update rebuilds the
//! index into a staging directory with the extended schema and swaps it in.

mod schema;
mod translate;

use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tantivy::collector::{Count, DocSetCollector, TopDocs};
use tantivy::query::{AllQuery, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, TantivyError, Term};
use tracing::{debug, info, warn};

use self::schema::{build_schema, FieldLayout};
use super::mapping::{FieldMapping, Mapping};
use super::{
    format_store_size, BulkItem, BulkOperation, BulkResponse, EngineClient, EngineError,
    EngineInfo, EngineResult, Hit, IndexInfo, SearchHits,
};
use crate::model::{Fields, SearchTarget};
use crate::query::QueryNode;

const MAPPING_FILE: &str = "mapping.json";

/// An opened index: tantivy handle plus its mapping and resolved fields
struct OpenIndex {
    index: Index,
    mapping: Mapping,
    layout: FieldLayout,
}

/// Local engine backed by tantivy
pub struct EmbeddedEngine {
    root: PathBuf,
    writer_heap_bytes: usize,
}

impl EmbeddedEngine {
    /// Open (creating if needed) an engine rooted at `root`
    pub fn open(root: &Path, writer_heap_bytes: usize) -> EngineResult<Self> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            writer_heap_bytes,
        })
    }

    fn index_dir(&self, name: &str) -> EngineResult<PathBuf> {
        validate_index_name(name)?;
        Ok(self.root.join(name))
    }

    fn open_index(&self, name: &str) -> EngineResult<OpenIndex> {
        let dir = self.index_dir(name)?;
        let mapping = read_mapping(&dir, name)?;
        let index = Index::open_in_dir(&dir)?;
        let layout = FieldLayout::resolve(&index.schema(), &mapping)?;
        Ok(OpenIndex {
            index,
            mapping,
            layout,
        })
    }

    fn writer(&self, index: &Index) -> EngineResult<IndexWriter> {
        Ok(index.writer(self.writer_heap_bytes)?)
    }

    /// Names of every index, sorted
    fn index_names(&self) -> EngineResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            // Staging and retired rebuild directories start with '.'
            if name.starts_with('.') || !entry.path().join(MAPPING_FILE).is_file() {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    /// Recreate `name` with `mapping`, carrying every stored document over.
    fn rebuild(&self, name: &str, mapping: &Mapping) -> EngineResult<()> {
        let current = self.open_index(name)?;
        let documents = all_documents(&current)?;
        drop(current);

        let dir = self.index_dir(name)?;
        let staging = self.root.join(format!(".{name}.rebuild"));
        let retired = self.root.join(format!(".{name}.old"));
        remove_dir_if_exists(&staging)?;
        remove_dir_if_exists(&retired)?;
        fs::create_dir_all(&staging)?;

        {
            let index = Index::create_in_dir(&staging, build_schema(mapping))?;
            let layout = FieldLayout::resolve(&index.schema(), mapping)?;
            let mut writer = self.writer(&index)?;
            for (id, source) in &documents {
                let document = layout.to_document(id, source).map_err(EngineError::Rejected)?;
                writer.add_document(document)?;
            }
            writer.commit()?;
        }
        write_mapping(&staging, mapping)?;

        fs::rename(&dir, &retired)?;
        fs::rename(&staging, &dir)?;
        fs::remove_dir_all(&retired)?;

        info!(
            index = name,
            docs = documents.len(),
            fields = mapping.properties.len(),
            "Rebuilt index with extended mapping"
        );
        Ok(())
    }

    /// Add mappings for fields of `documents` the index does not declare yet.
    fn extend_mapping_for(&self, name: &str, documents: &[&Fields]) -> EngineResult<()> {
        let current = self.get_mapping(name)?;
        let unseen = dynamic_mapping(documents, &current);
        if unseen.properties.is_empty() {
            return Ok(());
        }
        debug!(index = name, fields = unseen.properties.len(), "Dynamic mapping update");
        self.put_mapping(name, &unseen)
    }

    /// Write one index's share of a bulk request.
    fn write_batch(&self, name: &str, documents: &[&Fields]) -> EngineResult<Vec<BulkItem>> {
        validate_index_name(name)?;

        if self.index_exists(name)? {
            self.extend_mapping_for(name, documents)?;
        } else {
            let mapping = dynamic_mapping(documents, &Mapping::default());
            match self.create_index(name, &mapping) {
                Ok(()) | Err(EngineError::IndexAlreadyExists(_)) => {}
                Err(err) => return Err(err),
            }
            self.extend_mapping_for(name, documents)?;
        }

        let open = self.open_index(name)?;
        let mut writer = self.writer(&open.index)?;
        let mut items = Vec::with_capacity(documents.len());

        for source in documents {
            let id = uuid::Uuid::new_v4().simple().to_string();
            match open.layout.to_document(&id, source) {
                Ok(document) => {
                    writer.add_document(document)?;
                    items.push(BulkItem {
                        index: name.to_string(),
                        id: Some(id),
                        error: None,
                    });
                }
                Err(reason) => items.push(BulkItem {
                    index: name.to_string(),
                    id: None,
                    error: Some(reason),
                }),
            }
        }

        writer.commit()?;
        Ok(items)
    }
}

impl EngineClient for EmbeddedEngine {
    fn info(&self) -> EngineResult<EngineInfo> {
        Ok(EngineInfo {
            name: format!("embedded ({})", self.root.display()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    fn index_exists(&self, index: &str) -> EngineResult<bool> {
        Ok(self.index_dir(index)?.join(MAPPING_FILE).is_file())
    }

    fn create_index(&self, index: &str, mapping: &Mapping) -> EngineResult<()> {
        let dir = self.index_dir(index)?;
        if dir.join(MAPPING_FILE).is_file() {
            return Err(EngineError::IndexAlreadyExists(index.to_string()));
        }
        fs::create_dir_all(&dir)?;

        Index::create_in_dir(&dir, build_schema(mapping)).map_err(|err| match err {
            TantivyError::IndexAlreadyExists => EngineError::IndexAlreadyExists(index.to_string()),
            other => other.into(),
        })?;
        write_mapping(&dir, mapping)?;

        info!(index, fields = mapping.properties.len(), "Created index");
        Ok(())
    }

    fn get_mapping(&self, index: &str) -> EngineResult<Mapping> {
        read_mapping(&self.index_dir(index)?, index)
    }

    fn put_mapping(&self, index: &str, mapping: &Mapping) -> EngineResult<()> {
        let mut merged = self.get_mapping(index)?;
        match merged.merge_additive(mapping) {
            Ok(false) => Ok(()),
            Ok(true) => self.rebuild(index, &merged),
            Err(field) => Err(EngineError::Rejected(format!(
                "mapper [{field}] cannot be changed to a different type"
            ))),
        }
    }

    fn bulk_write(&self, operations: &[BulkOperation]) -> EngineResult<BulkResponse> {
        // Group by target index, remembering each operation's position
        let mut groups: IndexMap<&str, Vec<(usize, &Fields)>> = IndexMap::new();
        for (position, operation) in operations.iter().enumerate() {
            match operation {
                BulkOperation::Index { index, document } => groups
                    .entry(index.as_str())
                    .or_default()
                    .push((position, document)),
            }
        }

        let mut items: Vec<BulkItem> = vec![BulkItem::default(); operations.len()];
        for (name, entries) in groups {
            let documents: Vec<&Fields> = entries.iter().map(|(_, doc)| *doc).collect();
            match self.write_batch(name, &documents) {
                Ok(written) => {
                    for ((position, _), item) in entries.iter().zip(written) {
                        items[*position] = item;
                    }
                }
                Err(err) => {
                    warn!(index = name, error = %err, "Bulk batch rejected");
                    for (position, _) in &entries {
                        items[*position] = BulkItem {
                            index: name.to_string(),
                            id: None,
                            error: Some(err.to_string()),
                        };
                    }
                }
            }
        }

        Ok(BulkResponse { items })
    }

    fn search(
        &self,
        target: &SearchTarget,
        query: &QueryNode,
        size: usize,
    ) -> EngineResult<SearchHits> {
        let names = match target {
            SearchTarget::All => self.index_names()?,
            SearchTarget::Index(name) => {
                if !self.index_exists(name)? {
                    return Err(EngineError::IndexNotFound(name.clone()));
                }
                vec![name.clone()]
            }
        };

        // TopDocs rejects a zero limit
        let limit = size.max(1);
        let mut total = 0u64;
        let mut hits = Vec::new();

        for name in names {
            let open = self.open_index(&name)?;
            let searcher = open_searcher(&open.index)?;
            let compiled = translate::translate(query, &open.index, &open.layout)?;

            let (top_docs, count) =
                searcher.search(compiled.as_ref(), &(TopDocs::with_limit(limit), Count))?;
            total += count as u64;

            for (score, address) in top_docs {
                let document: TantivyDocument = searcher.doc(address)?;
                let (id, source) = open.layout.read_stored(&document)?;
                hits.push(Hit {
                    id,
                    index: name.clone(),
                    score,
                    source,
                });
            }
        }

        // Stable: ties keep index order
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(size);

        Ok(SearchHits { total, hits })
    }

    fn update(&self, index: &str, id: &str, partial: &Fields) -> EngineResult<()> {
        let mut open = self.open_index(index)?;
        let existing = find_by_id(&open, id)?.ok_or_else(|| EngineError::DocumentNotFound {
            index: index.to_string(),
            id: id.to_string(),
        })?;

        let mut merged = existing.clone();
        for (field, value) in partial {
            merged.insert(field.clone(), value.clone());
        }
        if merged == existing {
            debug!(index, id, "Update is a no-op");
            return Ok(());
        }

        if !dynamic_mapping(&[partial], &open.mapping).properties.is_empty() {
            drop(open);
            self.extend_mapping_for(index, &[partial])?;
            open = self.open_index(index)?;
        }

        let document = open
            .layout
            .to_document(id, &merged)
            .map_err(EngineError::Rejected)?;
        let mut writer = self.writer(&open.index)?;
        writer.delete_term(Term::from_field_text(open.layout.id, id));
        writer.add_document(document)?;
        writer.commit()?;

        debug!(index, id, "Updated document");
        Ok(())
    }

    fn delete(&self, index: &str, id: &str) -> EngineResult<()> {
        let open = self.open_index(index)?;
        if find_by_id(&open, id)?.is_none() {
            return Err(EngineError::DocumentNotFound {
                index: index.to_string(),
                id: id.to_string(),
            });
        }

        let mut writer = self.writer(&open.index)?;
        writer.delete_term(Term::from_field_text(open.layout.id, id));
        writer.commit()?;
        Ok(())
    }

    fn list_indices(&self) -> EngineResult<Vec<IndexInfo>> {
        let mut indices = Vec::new();
        for name in self.index_names()? {
            let open = self.open_index(&name)?;
            let docs_count = open_searcher(&open.index)?.num_docs();
            let size_bytes = dir_size(&self.root.join(&name))?;
            indices.push(IndexInfo {
                name,
                docs_count,
                store_size: format_store_size(size_bytes),
            });
        }
        Ok(indices)
    }
}

/// Elasticsearch index naming rules; also keeps names inside the data directory.
pub fn validate_index_name(name: &str) -> EngineResult<()> {
    let invalid = |reason: &str| {
        Err(EngineError::InvalidIndexName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return invalid("must not be empty");
    }
    if name.len() > 255 {
        return invalid("index name is too long");
    }
    if name != name.to_lowercase() {
        return invalid("must be lowercase");
    }
    if name.starts_with(['-', '_', '+', '.']) {
        return invalid("must not start with '_', '-', '+' or '.'");
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_whitespace() || r#"\/*?"<>|,#:"#.contains(*c))
    {
        return invalid(&format!("must not contain '{c}'"));
    }
    Ok(())
}

/// Mappings for every field in `documents` that `known` does not declare
fn dynamic_mapping(documents: &[&Fields], known: &Mapping) -> Mapping {
    let mut mapping = Mapping::default();
    for document in documents {
        for (field, value) in document.iter() {
            if known.contains(field) || mapping.contains(field) {
                continue;
            }
            let field_mapping = if value.is_boolean() {
                FieldMapping::boolean()
            } else {
                FieldMapping::text_with_keyword()
            };
            mapping.properties.insert(field.clone(), field_mapping);
        }
    }
    mapping
}

/// Point-in-time searcher over the last commit
fn open_searcher(index: &Index) -> EngineResult<Searcher> {
    let reader: IndexReader = index
        .reader_builder()
        .reload_policy(ReloadPolicy::Manual)
        .try_into()?;
    Ok(reader.searcher())
}

fn find_by_id(open: &OpenIndex, id: &str) -> EngineResult<Option<Fields>> {
    let searcher = open_searcher(&open.index)?;
    let query = TermQuery::new(
        Term::from_field_text(open.layout.id, id),
        IndexRecordOption::Basic,
    );
    let top = searcher.search(&query, &TopDocs::with_limit(1))?;
    match top.first() {
        Some((_, address)) => {
            let document: TantivyDocument = searcher.doc(*address)?;
            Ok(Some(open.layout.read_stored(&document)?.1))
        }
        None => Ok(None),
    }
}

/// Every stored document, in segment order
fn all_documents(open: &OpenIndex) -> EngineResult<Vec<(String, Fields)>> {
    let searcher = open_searcher(&open.index)?;
    let mut addresses: Vec<_> = searcher
        .search(&AllQuery, &DocSetCollector)?
        .into_iter()
        .collect();
    addresses.sort_by_key(|address| (address.segment_ord, address.doc_id));

    addresses
        .into_iter()
        .map(|address| {
            let document: TantivyDocument = searcher.doc(address)?;
            open.layout.read_stored(&document)
        })
        .collect()
}

fn read_mapping(dir: &Path, name: &str) -> EngineResult<Mapping> {
    let path = dir.join(MAPPING_FILE);
    if !path.is_file() {
        return Err(EngineError::IndexNotFound(name.to_string()));
    }
    let content = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}

fn write_mapping(dir: &Path, mapping: &Mapping) -> EngineResult<()> {
    let tmp = dir.join(format!("{MAPPING_FILE}.tmp"));
    fs::write(&tmp, serde_json::to_string_pretty(mapping)?)?;
    fs::rename(&tmp, dir.join(MAPPING_FILE))?;
    Ok(())
}

fn remove_dir_if_exists(path: &Path) -> EngineResult<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    Ok(())
}

fn dir_size(path: &Path) -> EngineResult<u64> {
    Ok(fs::read_dir(path)?
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SearchMode, DELETED_FIELD};
    use crate::query::build_query;
    use serde_json::json;
    use tempfile::TempDir;

    const HEAP: usize = 50_000_000;

    fn engine() -> (TempDir, EmbeddedEngine) {
        let dir = TempDir::new().unwrap();
        let engine = EmbeddedEngine::open(dir.path(), HEAP).unwrap();
        (dir, engine)
    }

    fn row(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect()
    }

    fn insert(engine: &EmbeddedEngine, index: &str, rows: Vec<Fields>) -> Vec<String> {
        let operations: Vec<_> = rows
            .into_iter()
            .map(|document| BulkOperation::Index {
                index: index.to_string(),
                document,
            })
            .collect();
        let response = engine.bulk_write(&operations).unwrap();
        assert!(!response.has_errors(), "{:?}", response.error_reasons());
        response.items.into_iter().filter_map(|i| i.id).collect()
    }

    fn search(engine: &EmbeddedEngine, query: &str, mode: SearchMode) -> SearchHits {
        engine
            .search(&SearchTarget::All, &build_query(query, mode), 100)
            .unwrap()
    }

    #[test]
    fn index_names_follow_elasticsearch_rules() {
        assert!(validate_index_name("streets_2024").is_ok());
        assert!(validate_index_name("Streets").is_err());
        assert!(validate_index_name("../escape").is_err());
        assert!(validate_index_name("_hidden").is_err());
        assert!(validate_index_name("a b").is_err());
        assert!(validate_index_name("").is_err());
    }

    #[test]
    fn create_twice_reports_already_exists() {
        let (_dir, engine) = engine();
        let mapping = Mapping::default().with_field("name", FieldMapping::text_with_keyword());
        engine.create_index("people", &mapping).unwrap();
        assert!(engine.index_exists("people").unwrap());
        assert!(matches!(
            engine.create_index("people", &mapping),
            Err(EngineError::IndexAlreadyExists(_))
        ));
    }

    #[test]
    fn bulk_write_creates_index_and_preserves_order() {
        let (_dir, engine) = engine();
        let ids = insert(
            &engine,
            "streets",
            vec![
                row(&[("name", "Herzl"), ("city", "Tel Aviv")]),
                row(&[("name", "Jaffa Road"), ("city", "Jerusalem")]),
            ],
        );
        assert_eq!(ids.len(), 2);

        let mapping = engine.get_mapping("streets").unwrap();
        assert_eq!(mapping.properties.keys().collect::<Vec<_>>(), vec!["name", "city"]);

        let indices = engine.list_indices().unwrap();
        assert_eq!(indices.len(), 1);
        assert_eq!(indices[0].docs_count, 2);
    }

    #[test]
    fn heterogeneous_rows_extend_the_mapping() {
        let (_dir, engine) = engine();
        insert(&engine, "mixed", vec![row(&[("name", "Herzl")])]);
        insert(&engine, "mixed", vec![row(&[("name", "Ibn Gabirol"), ("zip", "64000")])]);

        let mapping = engine.get_mapping("mixed").unwrap();
        assert!(mapping.contains("zip"));
        assert_eq!(search(&engine, "64000", SearchMode::Phrase).total, 1);
        assert_eq!(search(&engine, "Herzl", SearchMode::Phrase).total, 1);
    }

    #[test]
    fn bad_values_become_item_errors() {
        let (_dir, engine) = engine();
        let mapping = Mapping::default()
            .with_field("name", FieldMapping::text_with_keyword())
            .with_field("flag", FieldMapping::boolean());
        engine.create_index("flags", &mapping).unwrap();

        let operations = vec![
            BulkOperation::Index {
                index: "flags".into(),
                document: row(&[("name", "ok"), ("flag", "true")]),
            },
            BulkOperation::Index {
                index: "flags".into(),
                document: row(&[("name", "bad"), ("flag", "sometimes")]),
            },
        ];
        let response = engine.bulk_write(&operations).unwrap();
        assert!(response.items[0].error.is_none());
        assert_eq!(
            response.error_reasons(),
            vec!["failed to parse field [flag] of type [boolean]"]
        );
    }

    #[test]
    fn phrase_mode_requires_contiguous_tokens() {
        let (_dir, engine) = engine();
        insert(
            &engine,
            "cities",
            vec![
                row(&[("city", "Tel Aviv")]),
                row(&[("city", "Aviv Tel")]),
                row(&[("city", "Haifa")]),
            ],
        );
        let hits = search(&engine, "Tel Aviv", SearchMode::Phrase);
        assert_eq!(hits.total, 1);
        assert_eq!(hits.hits[0].source["city"], "Tel Aviv");
    }

    #[test]
    fn accurate_mode_requires_every_term() {
        let (_dir, engine) = engine();
        insert(
            &engine,
            "addresses",
            vec![
                row(&[("street", "Main Street"), ("city", "Springfield")]),
                row(&[("street", "Main Road"), ("city", "Shelbyville")]),
            ],
        );
        let hits = search(&engine, "Main Street", SearchMode::Accurate);
        assert_eq!(hits.total, 1);
        assert_eq!(hits.hits[0].source["street"], "Main Street");
    }

    #[test]
    fn free_mode_tolerates_typos_and_prefixes() {
        let (_dir, engine) = engine();
        insert(
            &engine,
            "streets",
            vec![row(&[("name", "Rothschild Boulevard")]), row(&[("name", "Allenby")])],
        );
        // one edit away
        let typo = search(&engine, "Rotschild", SearchMode::Free);
        assert_eq!(typo.total, 1);
        // starts-with completion
        let prefix = search(&engine, "Allen", SearchMode::Free);
        assert_eq!(prefix.total, 1);
        assert_eq!(prefix.hits[0].source["name"], "Allenby");
    }

    #[test]
    fn flagged_documents_are_filtered_without_changing_counts() {
        let (_dir, engine) = engine();
        let ids = insert(
            &engine,
            "people",
            vec![row(&[("name", "Dana")]), row(&[("name", "Dana Levi")])],
        );
        engine
            .put_mapping(
                "people",
                &Mapping::default().with_field(DELETED_FIELD, FieldMapping::boolean()),
            )
            .unwrap();

        let mut flag = Fields::new();
        flag.insert(DELETED_FIELD.into(), json!(true));
        engine.update("people", &ids[0], &flag).unwrap();
        // second time is a no-op
        engine.update("people", &ids[0], &flag).unwrap();

        let hits = search(&engine, "Dana", SearchMode::Free);
        assert_eq!(hits.total, 1);
        assert_eq!(hits.hits[0].id, ids[1]);
        assert_eq!(engine.list_indices().unwrap()[0].docs_count, 2);
    }

    #[test]
    fn update_and_delete_report_missing_documents() {
        let (_dir, engine) = engine();
        insert(&engine, "people", vec![row(&[("name", "Dana")])]);
        let mut flag = Fields::new();
        flag.insert("note".into(), json!("x"));

        assert!(matches!(
            engine.update("people", "nope", &flag),
            Err(EngineError::DocumentNotFound { .. })
        ));
        assert!(matches!(
            engine.delete("people", "nope"),
            Err(EngineError::DocumentNotFound { .. })
        ));
        assert!(matches!(
            engine.update("ghost", "nope", &flag),
            Err(EngineError::IndexNotFound(_))
        ));
    }

    #[test]
    fn physical_delete_shrinks_the_count() {
        let (_dir, engine) = engine();
        let ids = insert(&engine, "people", vec![row(&[("name", "Dana")]), row(&[("name", "Noa")])]);
        engine.delete("people", &ids[0]).unwrap();
        assert_eq!(engine.list_indices().unwrap()[0].docs_count, 1);
    }

    #[test]
    fn mapping_conflicts_are_rejected() {
        let (_dir, engine) = engine();
        insert(&engine, "people", vec![row(&[("name", "Dana")])]);
        let conflict = Mapping::default().with_field("name", FieldMapping::boolean());
        assert!(matches!(
            engine.put_mapping("people", &conflict),
            Err(EngineError::Rejected(_))
        ));
    }

    #[test]
    fn search_all_merges_indices_and_counts_total() {
        let (_dir, engine) = engine();
        insert(&engine, "a", vec![row(&[("name", "shared term")])]);
        insert(&engine, "b", vec![row(&[("name", "shared")]), row(&[("name", "shared too")])]);

        let query = build_query("shared", SearchMode::Phrase);
        let hits = engine.search(&SearchTarget::All, &query, 2).unwrap();
        assert_eq!(hits.total, 3);
        assert_eq!(hits.hits.len(), 2);

        let only_a = engine
            .search(&SearchTarget::Index("a".into()), &query, 100)
            .unwrap();
        assert_eq!(only_a.total, 1);
        assert_eq!(only_a.hits[0].index, "a");

        assert!(matches!(
            engine.search(&SearchTarget::Index("missing".into()), &query, 100),
            Err(EngineError::IndexNotFound(_))
        ));
    }
}
