//! Query tree and the mode-specific query builder
//!
//! The tree mirrors the Elasticsearch query DSL closely enough that it
//! serializes straight into a `_search` body; the embedded engine
//! translates the same tree into tantivy queries.
//!
//! Every built query has the shape
//! `bool { must: [<mode clause>], must_not: [term deleted = true] }`,
//! which is what keeps soft-deleted documents out of every search.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::model::{SearchMode, DELETED_FIELD};

/// Tie breaker for the free-mode `dis_max`; documents matching both
/// strategies outrank documents matching one.
pub const FREE_MODE_TIE_BREAKER: f32 = 0.3;

/// A node of the engine query tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryNode {
    Bool(BoolQuery),
    QueryString(QueryStringQuery),
    MultiMatch(MultiMatchQuery),
    DisMax(DisMaxQuery),
    Term(TermQuery),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BoolQuery {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must: Vec<QueryNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub should: Vec<QueryNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub must_not: Vec<QueryNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryStringQuery {
    pub query: String,
    pub analyze_wildcard: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiMatchType {
    BestFields,
    Phrase,
    PhrasePrefix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Or,
    And,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fuzziness {
    #[serde(rename = "AUTO")]
    Auto,
}

impl Fuzziness {
    /// Edit distance the engine allows for a term of `len` characters.
    pub fn distance_for(&self, len: usize) -> u8 {
        match self {
            Fuzziness::Auto => match len {
                0..=2 => 0,
                3..=5 => 1,
                _ => 2,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiMatchQuery {
    pub query: String,
    pub fields: Vec<String>,
    #[serde(rename = "type")]
    pub kind: MultiMatchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzziness: Option<Fuzziness>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisMaxQuery {
    pub queries: Vec<QueryNode>,
    pub tie_breaker: f32,
}

/// Exact value match on a single field
#[derive(Debug, Clone, PartialEq)]
pub struct TermQuery {
    pub field: String,
    pub value: serde_json::Value,
}

// `{"term": {"<field>": {"value": <value>}}}`
impl Serialize for TermQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &serde_json::json!({ "value": self.value }))?;
        map.end()
    }
}

impl QueryNode {
    pub fn term(field: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        QueryNode::Term(TermQuery {
            field: field.into(),
            value: value.into(),
        })
    }

    /// Render as an Elasticsearch query DSL object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Build the engine query for `query` under `mode`.
///
/// Pure and deterministic. The caller rejects blank queries beforehand.
pub fn build_query(query: &str, mode: SearchMode) -> QueryNode {
    let clause = match mode {
        SearchMode::Accurate => accurate_clause(query),
        SearchMode::Phrase => phrase_clause(query),
        SearchMode::Free => free_clause(query),
    };

    QueryNode::Bool(BoolQuery {
        must: vec![clause],
        must_not: vec![QueryNode::term(DELETED_FIELD, true)],
        ..Default::default()
    })
}

fn accurate_clause(query: &str) -> QueryNode {
    let fragments: Vec<String> = query
        .split_whitespace()
        .map(|term| format!("\"{}\"", escape_fragment(term)))
        .collect();

    QueryNode::QueryString(QueryStringQuery {
        query: fragments.join(" AND "),
        analyze_wildcard: true,
    })
}

fn phrase_clause(query: &str) -> QueryNode {
    QueryNode::MultiMatch(MultiMatchQuery {
        query: query.to_string(),
        fields: vec!["*".to_string()],
        kind: MultiMatchType::Phrase,
        operator: None,
        fuzziness: None,
    })
}

fn free_clause(query: &str) -> QueryNode {
    let fuzzy = QueryNode::MultiMatch(MultiMatchQuery {
        query: query.to_string(),
        fields: vec!["*".to_string()],
        kind: MultiMatchType::BestFields,
        operator: Some(Operator::Or),
        fuzziness: Some(Fuzziness::Auto),
    });
    let prefix = QueryNode::MultiMatch(MultiMatchQuery {
        query: query.to_string(),
        fields: vec!["*".to_string()],
        kind: MultiMatchType::PhrasePrefix,
        operator: None,
        fuzziness: None,
    });

    QueryNode::DisMax(DisMaxQuery {
        queries: vec![fuzzy, prefix],
        tie_breaker: FREE_MODE_TIE_BREAKER,
    })
}

/// Quotes and backslashes inside a quoted fragment must be escaped.
fn escape_fragment(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for ch in term.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn has_tombstone_filter(node: &QueryNode) -> bool {
        match node {
            QueryNode::Bool(b) => b
                .must_not
                .iter()
                .any(|n| *n == QueryNode::term(DELETED_FIELD, true)),
            _ => false,
        }
    }

    #[test]
    fn every_mode_excludes_deleted_documents() {
        for mode in [SearchMode::Free, SearchMode::Accurate, SearchMode::Phrase] {
            for q in ["a", "Main Street", "tel aviv yafo", "x\"y"] {
                assert!(has_tombstone_filter(&build_query(q, mode)), "{mode} {q}");
            }
        }
    }

    #[test]
    fn unknown_mode_matches_free_output() {
        let fallback = build_query("herzl", SearchMode::parse_lenient(Some("bogus")));
        assert_eq!(fallback, build_query("herzl", SearchMode::Free));
    }

    #[test]
    fn accurate_requires_every_term() {
        let node = build_query("Main  Street", SearchMode::Accurate);
        assert_eq!(
            node.to_json(),
            json!({
                "bool": {
                    "must": [{
                        "query_string": {
                            "query": "\"Main\" AND \"Street\"",
                            "analyze_wildcard": true
                        }
                    }],
                    "must_not": [{ "term": { "deleted": { "value": true } } }]
                }
            })
        );
    }

    #[test]
    fn accurate_escapes_embedded_quotes() {
        let node = build_query("say\"hi", SearchMode::Accurate);
        let QueryNode::Bool(b) = node else { panic!("expected bool") };
        let QueryNode::QueryString(qs) = &b.must[0] else { panic!("expected query_string") };
        assert_eq!(qs.query, "\"say\\\"hi\"");
    }

    #[test]
    fn phrase_searches_all_fields() {
        let json = build_query("Tel Aviv", SearchMode::Phrase).to_json();
        assert_eq!(
            json["bool"]["must"][0],
            json!({ "multi_match": { "query": "Tel Aviv", "fields": ["*"], "type": "phrase" } })
        );
    }

    #[test]
    fn free_combines_fuzzy_and_prefix() {
        let json = build_query("herz", SearchMode::Free).to_json();
        let dis_max = &json["bool"]["must"][0]["dis_max"];
        assert_eq!(dis_max["queries"][0]["multi_match"]["type"], "best_fields");
        assert_eq!(dis_max["queries"][0]["multi_match"]["fuzziness"], "AUTO");
        assert_eq!(dis_max["queries"][0]["multi_match"]["operator"], "or");
        assert_eq!(dis_max["queries"][1]["multi_match"]["type"], "phrase_prefix");
        assert!(dis_max["tie_breaker"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn auto_fuzziness_scales_with_length() {
        assert_eq!(Fuzziness::Auto.distance_for(2), 0);
        assert_eq!(Fuzziness::Auto.distance_for(4), 1);
        assert_eq!(Fuzziness::Auto.distance_for(9), 2);
    }
}
