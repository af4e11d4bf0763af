//! JSON rendering for compiled queries.
//!
//! Both query ASTs render to `serde_json::Value` and implement
//! [`serde::Serialize`] through that rendering, so they can be embedded in
//! larger documents or printed directly.
//!
//! - Document target: MongoDB operators (`$eq`, `$in`, `$elemMatch`, ...),
//!   dates as `{"$date": "<iso>"}`
//! - Search target: Elasticsearch query DSL, dates as ISO strings
//!
//! Objects come out with sorted keys, so output is deterministic.
//!
//! # Examples
//!
//! ```
//! use rules_query::document::DocumentQuery;
//! use rules_query::output::{to_json, to_json_pretty};
//!
//! let query = DocumentQuery::MatchAll;
//!
//! assert_eq!(to_json(&query).unwrap(), "{}");
//! assert_eq!(to_json_pretty(&query).unwrap(), "{}");
//! ```

use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::{
    document::{Condition, DocumentQuery, FieldClause},
    search::{BoolQuery, SearchQuery},
    value::{Literal, format_date},
};

/// Script making a `terms_set` query require every listed term.
pub const ALL_TERMS_SCRIPT: &str = "params.num_terms";

/// Compact JSON text.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

/// JSON text with 2-space indentation.
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

// ============================================================================
// Document target
// ============================================================================

pub fn document_to_json(query: &DocumentQuery) -> Value {
    match query {
        DocumentQuery::MatchAll => Value::Object(Map::new()),
        DocumentQuery::Fields(clauses) => Value::Object(fields_to_map(clauses)),
        DocumentQuery::And(queries) => {
            json!({ "$and": queries.iter().map(document_to_json).collect::<Vec<_>>() })
        }
        DocumentQuery::Or(queries) => {
            json!({ "$or": queries.iter().map(document_to_json).collect::<Vec<_>>() })
        }
    }
}

fn fields_to_map(clauses: &[FieldClause]) -> Map<String, Value> {
    clauses
        .iter()
        .map(|clause| (clause.path.clone(), condition_to_json(&clause.condition)))
        .collect()
}

fn condition_to_json(condition: &Condition) -> Value {
    match condition {
        Condition::Equals(value) => document_literal(value),
        Condition::Compare { op, value } => json!({ op.as_str(): document_literal(value) }),
        Condition::Set { op, values } => {
            json!({ op.as_str(): values.iter().map(document_literal).collect::<Vec<_>>() })
        }
        Condition::Regex {
            pattern,
            case_insensitive: true,
        } => json!({ "$regex": pattern, "$options": "i" }),
        Condition::Regex { pattern, .. } => json!({ "$regex": pattern }),
        Condition::ElementMatch(inner) => json!({ "$elemMatch": document_to_json(inner) }),
    }
}

/// Dates use extended JSON so the store compares them as dates.
pub fn document_literal(value: &Literal) -> Value {
    match value {
        Literal::Date(date) => json!({ "$date": format_date(date) }),
        other => other.to_json(),
    }
}

impl Serialize for DocumentQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        document_to_json(self).serialize(serializer)
    }
}

// ============================================================================
// Search target
// ============================================================================

pub fn search_to_json(query: &SearchQuery) -> Value {
    match query {
        SearchQuery::MatchAll => json!({ "match_all": {} }),
        SearchQuery::Term { field, value } => json!({ "term": { field: value.to_json() } }),
        SearchQuery::Terms { field, values } => json!({ "terms": { field: literals(values) } }),
        SearchQuery::TermsSet { field, values } => json!({
            "terms_set": {
                field: {
                    "terms": literals(values),
                    "minimum_should_match_script": { "source": ALL_TERMS_SCRIPT }
                }
            }
        }),
        SearchQuery::Match { field, value } => json!({ "match": { field: value.to_json() } }),
        SearchQuery::Prefix { field, value } => json!({ "prefix": { field: value } }),
        SearchQuery::Range {
            field,
            bound,
            value,
        } => json!({ "range": { field: { bound.as_str(): value.to_json() } } }),
        SearchQuery::Nested { path, query } => json!({
            "nested": { "path": path, "query": search_to_json(query) }
        }),
        SearchQuery::Bool(bool_query) => json!({ "bool": bool_to_map(bool_query) }),
    }
}

fn bool_to_map(query: &BoolQuery) -> Map<String, Value> {
    [
        ("must", &query.must),
        ("filter", &query.filter),
        ("should", &query.should),
        ("must_not", &query.must_not),
    ]
    .into_iter()
    .filter(|(_, clauses)| !clauses.is_empty())
    .map(|(occur, clauses)| {
        (
            occur.to_string(),
            Value::Array(clauses.iter().map(search_to_json).collect()),
        )
    })
    .collect()
}

fn literals(values: &[Literal]) -> Vec<Value> {
    values.iter().map(Literal::to_json).collect()
}

impl Serialize for SearchQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        search_to_json(self).serialize(serializer)
    }
}
