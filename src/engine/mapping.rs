//! Index mapping types, serialized in the Elasticsearch mapping shape
//!
//! ```json
//! { "properties": { "city": { "type": "text", "fields": { "keyword": { "type": "keyword" } } } } }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name of the exact-match sub-field attached to every inferred text field
pub const KEYWORD_SUBFIELD: &str = "keyword";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Keyword,
    Boolean,
    /// Any type this crate never declares itself (`long`, `date`, ...)
    #[default]
    #[serde(other)]
    Other,
}

/// Sub-field declaration (only the type is tracked)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubField {
    #[serde(rename = "type")]
    pub kind: FieldType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(rename = "type", default)]
    pub kind: FieldType,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, SubField>,
}

impl FieldMapping {
    /// Full-text field with a `keyword` sub-field for exact matching
    pub fn text_with_keyword() -> Self {
        let mut fields = IndexMap::new();
        fields.insert(
            KEYWORD_SUBFIELD.to_string(),
            SubField {
                kind: FieldType::Keyword,
            },
        );
        Self {
            kind: FieldType::Text,
            fields,
        }
    }

    pub fn boolean() -> Self {
        Self {
            kind: FieldType::Boolean,
            fields: IndexMap::new(),
        }
    }

    pub fn has_keyword(&self) -> bool {
        self.fields.contains_key(KEYWORD_SUBFIELD)
    }
}

/// Declared fields of an index, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    #[serde(default)]
    pub properties: IndexMap<String, FieldMapping>,
}

impl Mapping {
    pub fn contains(&self, field: &str) -> bool {
        self.properties.contains_key(field)
    }

    pub fn with_field(mut self, name: impl Into<String>, field: FieldMapping) -> Self {
        self.properties.insert(name.into(), field);
        self
    }

    /// Merge `other` into this mapping without removing or retyping fields.
    ///
    /// Returns `Ok(true)` when new fields were added and `Err(field)` when
    /// `other` redeclares an existing field with a different type.
    pub fn merge_additive(&mut self, other: &Mapping) -> Result<bool, String> {
        let mut changed = false;
        for (name, field) in &other.properties {
            match self.properties.get(name) {
                Some(existing) if existing.kind != field.kind => return Err(name.clone()),
                Some(_) => {}
                None => {
                    self.properties.insert(name.clone(), field.clone());
                    changed = true;
                }
            }
        }
        Ok(changed)
    }
}
