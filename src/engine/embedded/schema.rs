//! Tantivy schema derived from an index mapping
//!
//! Fields:
//! - _id: raw + stored (document identifier, used for updates)
//! - _source: stored only (the document as JSON, field order preserved)
//! - t{n}: full-text slot for the n-th mapped field
//! - k{n}: exact-match (keyword) slot for the n-th mapped field
//! - b{n}: boolean slot for the n-th mapped field
//!
//! Slots are positional so CSV headers never have to be valid tantivy
//! field names. Mappings only grow, so existing slot numbers never move.

use serde_json::Value as JsonValue;
use tantivy::schema::*;
use tantivy::TantivyDocument;

use crate::engine::mapping::{FieldType, Mapping, KEYWORD_SUBFIELD};
use crate::engine::{EngineError, EngineResult};
use crate::model::Fields;

pub const ID_FIELD: &str = "_id";
pub const SOURCE_FIELD: &str = "_source";

fn text_slot(slot: usize) -> String {
    format!("t{slot}")
}

fn keyword_slot(slot: usize) -> String {
    format!("k{slot}")
}

fn bool_slot(slot: usize) -> String {
    format!("b{slot}")
}

/// Build the tantivy schema for `mapping`
pub fn build_schema(mapping: &Mapping) -> Schema {
    let mut schema_builder = Schema::builder();

    schema_builder.add_text_field(ID_FIELD, STRING | STORED);
    schema_builder.add_text_field(SOURCE_FIELD, STORED);

    // Full-text slots need positions for phrase and phrase-prefix queries
    let text_options = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer("default")
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    );

    for (slot, field) in mapping.properties.values().enumerate() {
        match field.kind {
            FieldType::Text => {
                schema_builder.add_text_field(&text_slot(slot), text_options.clone());
                if field.has_keyword() {
                    schema_builder.add_text_field(&keyword_slot(slot), STRING);
                }
            }
            FieldType::Keyword => {
                schema_builder.add_text_field(&keyword_slot(slot), STRING);
            }
            FieldType::Boolean => {
                schema_builder.add_bool_field(&bool_slot(slot), INDEXED);
            }
            // Kept in _source, not searchable
            FieldType::Other => {}
        }
    }

    schema_builder.build()
}

/// Tantivy fields backing one mapped field
#[derive(Debug, Clone)]
pub struct MappedField {
    pub name: String,
    pub kind: FieldType,
    pub text: Option<Field>,
    pub keyword: Option<Field>,
    pub boolean: Option<Field>,
}

/// Resolved tantivy fields of one index
#[derive(Debug, Clone)]
pub struct FieldLayout {
    pub id: Field,
    pub source: Field,
    pub fields: Vec<MappedField>,
}

impl FieldLayout {
    pub fn resolve(schema: &Schema, mapping: &Mapping) -> EngineResult<Self> {
        let get = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| EngineError::Storage(format!("schema missing {name}")))
        };

        let fields = mapping
            .properties
            .iter()
            .enumerate()
            .map(|(slot, (name, field))| MappedField {
                name: name.clone(),
                kind: field.kind,
                text: schema.get_field(&text_slot(slot)).ok(),
                keyword: schema.get_field(&keyword_slot(slot)).ok(),
                boolean: schema.get_field(&bool_slot(slot)).ok(),
            })
            .collect();

        Ok(Self {
            id: get(ID_FIELD)?,
            source: get(SOURCE_FIELD)?,
            fields,
        })
    }

    /// Every full-text slot, in mapping order
    pub fn text_fields(&self) -> Vec<Field> {
        self.fields.iter().filter_map(|f| f.text).collect()
    }

    /// Look up `name` or `name.keyword`; the flag reports the keyword suffix.
    pub fn find(&self, name: &str) -> Option<(&MappedField, bool)> {
        if let Some(field) = self.fields.iter().find(|f| f.name == name) {
            return Some((field, false));
        }
        let base = name.strip_suffix(KEYWORD_SUBFIELD)?.strip_suffix('.')?;
        self.fields
            .iter()
            .find(|f| f.name == base)
            .map(|field| (field, true))
    }

    /// Convert a source document into a tantivy document.
    ///
    /// Errors carry a per-item reason suitable for a bulk response.
    pub fn to_document(&self, id: &str, source: &Fields) -> Result<TantivyDocument, String> {
        let mut doc = TantivyDocument::default();
        doc.add_text(self.id, id);
        let raw = serde_json::to_string(source).map_err(|e| e.to_string())?;
        doc.add_text(self.source, raw);

        for field in &self.fields {
            let Some(value) = source.get(&field.name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            match field.kind {
                FieldType::Text | FieldType::Keyword => {
                    let text = scalar_text(value).ok_or_else(|| parse_failure(field))?;
                    if let Some(slot) = field.text {
                        doc.add_text(slot, &text);
                    }
                    if let Some(slot) = field.keyword {
                        doc.add_text(slot, &text);
                    }
                }
                FieldType::Boolean => {
                    let flag = coerce_bool(value).ok_or_else(|| parse_failure(field))?;
                    if let Some(slot) = field.boolean {
                        doc.add_bool(slot, flag);
                    }
                }
                FieldType::Other => {}
            }
        }

        Ok(doc)
    }

    /// Read `_id` and `_source` back from a stored document
    pub fn read_stored(&self, doc: &TantivyDocument) -> EngineResult<(String, Fields)> {
        let id = doc
            .get_first(self.id)
            .and_then(|v| v.as_str())
            .ok_or_else(|| EngineError::Storage("stored document without _id".to_string()))?
            .to_string();
        let raw = doc
            .get_first(self.source)
            .and_then(|v| v.as_str())
            .unwrap_or("{}");
        let source: Fields = serde_json::from_str(raw)?;
        Ok((id, source))
    }
}

fn parse_failure(field: &MappedField) -> String {
    let kind = match field.kind {
        FieldType::Text => "text",
        FieldType::Keyword => "keyword",
        FieldType::Boolean => "boolean",
        FieldType::Other => "object",
    };
    format!("failed to parse field [{}] of type [{}]", field.name, kind)
}

pub(super) fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_bool(value: &JsonValue) -> Option<bool> {
    match value {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::String(s) if s == "true" => Some(true),
        JsonValue::String(s) if s == "false" || s.is_empty() => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mapping::FieldMapping;
    use serde_json::json;

    fn mapping() -> Mapping {
        Mapping::default()
            .with_field("name", FieldMapping::text_with_keyword())
            .with_field("deleted", FieldMapping::boolean())
    }

    #[test]
    fn slots_follow_mapping_order() {
        let schema = build_schema(&mapping());
        for name in ["_id", "_source", "t0", "k0", "b1"] {
            assert!(schema.get_field(name).is_ok(), "missing {name}");
        }
        assert!(schema.get_field("t1").is_err());
    }

    #[test]
    fn finds_keyword_subfield() {
        let schema = build_schema(&mapping());
        let layout = FieldLayout::resolve(&schema, &mapping()).unwrap();
        let (field, keyword) = layout.find("name.keyword").unwrap();
        assert_eq!(field.name, "name");
        assert!(keyword);
        assert!(layout.find("missing").is_none());
    }

    #[test]
    fn rejects_values_that_do_not_fit_the_mapping() {
        let schema = build_schema(&mapping());
        let layout = FieldLayout::resolve(&schema, &mapping()).unwrap();

        let mut ok = Fields::new();
        ok.insert("name".into(), json!("Herzl"));
        ok.insert("deleted".into(), json!(true));
        assert!(layout.to_document("1", &ok).is_ok());

        let mut bad = Fields::new();
        bad.insert("deleted".into(), json!("maybe"));
        let reason = layout.to_document("2", &bad).unwrap_err();
        assert_eq!(reason, "failed to parse field [deleted] of type [boolean]");
    }

    #[test]
    fn stored_source_round_trips() {
        let schema = build_schema(&mapping());
        let layout = FieldLayout::resolve(&schema, &mapping()).unwrap();
        let mut source = Fields::new();
        source.insert("zeta".into(), json!("last"));
        source.insert("name".into(), json!("Herzl"));

        let doc = layout.to_document("abc", &source).unwrap();
        let (id, back) = layout.read_stored(&doc).unwrap();
        assert_eq!(id, "abc");
        assert_eq!(back.keys().collect::<Vec<_>>(), vec!["zeta", "name"]);
    }
}
