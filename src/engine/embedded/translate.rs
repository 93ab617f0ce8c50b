//! Translation of the engine query tree into tantivy queries

use tantivy::query::{
    AllQuery, BooleanQuery, DisjunctionMaxQuery, EmptyQuery, FuzzyTermQuery, Occur,
    PhrasePrefixQuery, PhraseQuery, Query, QueryParser, TermQuery,
};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::tokenizer::TokenStream;
use tantivy::{Index, Term};

use super::schema::{scalar_text, FieldLayout};
use crate::engine::EngineResult;
use crate::query::{
    BoolQuery, DisMaxQuery, MultiMatchQuery, MultiMatchType, Operator, QueryNode,
    QueryStringQuery, TermQuery as TermNode,
};

/// Compile `node` for one index
pub fn translate(node: &QueryNode, index: &Index, layout: &FieldLayout) -> EngineResult<Box<dyn Query>> {
    match node {
        QueryNode::Bool(b) => translate_bool(b, index, layout),
        QueryNode::QueryString(qs) => Ok(translate_query_string(qs, index, layout)),
        QueryNode::MultiMatch(mm) => translate_multi_match(mm, index, layout),
        QueryNode::DisMax(dm) => translate_dis_max(dm, index, layout),
        QueryNode::Term(t) => Ok(translate_term(t, layout)),
    }
}

fn translate_bool(b: &BoolQuery, index: &Index, layout: &FieldLayout) -> EngineResult<Box<dyn Query>> {
    let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
    for node in &b.must {
        clauses.push((Occur::Must, translate(node, index, layout)?));
    }
    for node in &b.should {
        clauses.push((Occur::Should, translate(node, index, layout)?));
    }
    for node in &b.must_not {
        clauses.push((Occur::MustNot, translate(node, index, layout)?));
    }
    // A purely negative boolean query matches nothing in tantivy
    if b.must.is_empty() && b.should.is_empty() {
        clauses.push((Occur::Must, Box::new(AllQuery)));
    }
    Ok(Box::new(BooleanQuery::new(clauses)))
}

fn translate_query_string(qs: &QueryStringQuery, index: &Index, layout: &FieldLayout) -> Box<dyn Query> {
    let fields = layout.text_fields();
    if fields.is_empty() {
        return Box::new(EmptyQuery);
    }
    // analyze_wildcard has no counterpart here; quoted fragments match as phrases
    let parser = QueryParser::for_index(index, fields);
    let (query, errors) = parser.parse_query_lenient(&qs.query);
    if !errors.is_empty() {
        tracing::debug!(query = %qs.query, errors = errors.len(), "Lenient query_string parse");
    }
    query
}

fn translate_multi_match(
    mm: &MultiMatchQuery,
    index: &Index,
    layout: &FieldLayout,
) -> EngineResult<Box<dyn Query>> {
    let mut per_field: Vec<Box<dyn Query>> = Vec::new();

    for field in match_fields(&mm.fields, layout) {
        let tokens = analyze(index, field, &mm.query)?;
        if tokens.is_empty() {
            continue;
        }
        let terms: Vec<Term> = tokens
            .iter()
            .map(|token| Term::from_field_text(field, token))
            .collect();

        let query: Box<dyn Query> = match mm.kind {
            MultiMatchType::BestFields => {
                let occur = match mm.operator {
                    Some(Operator::And) => Occur::Must,
                    _ => Occur::Should,
                };
                let clauses = terms
                    .into_iter()
                    .zip(&tokens)
                    .map(|(term, token)| (occur, term_clause(term, token, mm)))
                    .collect();
                Box::new(BooleanQuery::new(clauses))
            }
            MultiMatchType::Phrase => {
                if terms.len() == 1 {
                    Box::new(TermQuery::new(
                        terms[0].clone(),
                        IndexRecordOption::WithFreqs,
                    ))
                } else {
                    Box::new(PhraseQuery::new(terms))
                }
            }
            MultiMatchType::PhrasePrefix => {
                if terms.len() == 1 {
                    Box::new(FuzzyTermQuery::new_prefix(terms[0].clone(), 0, true))
                } else {
                    Box::new(PhrasePrefixQuery::new(terms))
                }
            }
        };
        per_field.push(query);
    }

    if per_field.is_empty() {
        return Ok(Box::new(EmptyQuery));
    }
    Ok(Box::new(DisjunctionMaxQuery::new(per_field)))
}

/// One query term: exact match scored by BM25, widened by a fuzzy match when
/// fuzziness is requested.
fn term_clause(term: Term, token: &str, mm: &MultiMatchQuery) -> Box<dyn Query> {
    let exact: Box<dyn Query> = Box::new(TermQuery::new(term.clone(), IndexRecordOption::WithFreqs));
    let Some(fuzziness) = mm.fuzziness else {
        return exact;
    };
    let distance = fuzziness.distance_for(token.chars().count());
    if distance == 0 {
        return exact;
    }
    let fuzzy: Box<dyn Query> = Box::new(FuzzyTermQuery::new(term, distance, true));
    Box::new(BooleanQuery::new(vec![
        (Occur::Should, exact),
        (Occur::Should, fuzzy),
    ]))
}

fn translate_dis_max(dm: &DisMaxQuery, index: &Index, layout: &FieldLayout) -> EngineResult<Box<dyn Query>> {
    let disjuncts = dm
        .queries
        .iter()
        .map(|node| translate(node, index, layout))
        .collect::<EngineResult<Vec<_>>>()?;
    Ok(Box::new(DisjunctionMaxQuery::with_tie_breaker(
        disjuncts,
        dm.tie_breaker,
    )))
}

fn translate_term(t: &TermNode, layout: &FieldLayout) -> Box<dyn Query> {
    let Some((field, _)) = layout.find(&t.field) else {
        // Unmapped field: nothing can match
        return Box::new(EmptyQuery);
    };

    let term = match (&t.value, field.boolean) {
        (serde_json::Value::Bool(flag), Some(slot)) => Some(Term::from_field_bool(slot, *flag)),
        // Non-boolean fields compare the value's text form, as Elasticsearch coerces it:
        // exact slot first, else the analyzed slot
        (value, _) => scalar_text(value).and_then(|text| {
            field
                .keyword
                .map(|f| Term::from_field_text(f, &text))
                .or_else(|| field.text.map(|f| Term::from_field_text(f, &text.to_lowercase())))
        }),
    };

    match term {
        Some(term) => Box::new(TermQuery::new(term, IndexRecordOption::Basic)),
        None => Box::new(EmptyQuery),
    }
}

/// `*` expands to every full-text slot; other entries name single fields.
fn match_fields(patterns: &[String], layout: &FieldLayout) -> Vec<Field> {
    let mut fields = Vec::new();
    for pattern in patterns {
        if pattern == "*" {
            for field in layout.text_fields() {
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
        } else if let Some(field) = layout.find(pattern).and_then(|(f, _)| f.text) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
    }
    fields
}

/// Run `text` through the tokenizer registered for `field`.
fn analyze(index: &Index, field: Field, text: &str) -> EngineResult<Vec<String>> {
    let mut analyzer = index.tokenizer_for_field(field)?;
    let mut stream = analyzer.token_stream(text);
    let mut tokens = Vec::new();
    while stream.advance() {
        tokens.push(stream.token().text.clone());
    }
    Ok(tokens)
}
