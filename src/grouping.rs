//! Grouped-query resolution.
//!
//! Sibling comparisons joined by one connective whose attributes share an
//! array-valued ancestor are collapsed into a single clause that must hold
//! within one array element, instead of independent clauses that could each
//! be satisfied by a different element:
//!
//! ```text
//! prices.price EQ 100 AND prices.currency EQ "GBP"
//!
//! {"prices": {"$elemMatch": {"$and": [{"price": {"$eq": 100}}, {"currency": {"$eq": "GBP"}}]}}}
//! ```
//!
//! Clauses on the very same attribute are never collapsed.

use tracing::trace;

use crate::{
    ast::LogicalOp,
    document::{Condition, DocumentQuery, FieldClause},
    path::{self, common_prefix},
    schema::{AttributeType, SchemaLookup},
};

/// Which kind of ancestor a grouping root must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// Any array-valued attribute (document store element match)
    Array,
    /// An array of sub-documents (search engine nested field)
    Nested,
}

impl RootKind {
    fn accepts(self, attribute: &AttributeType) -> bool {
        match self {
            RootKind::Array => attribute.array_valued,
            RootKind::Nested => attribute.is_nested(),
        }
    }
}

/// Closest ancestor shared by all `paths` that is a grouping root of `kind`.
///
/// Starts from the longest common dot-segment prefix and walks upward.
/// Returns `None` for fewer than two paths, when there is no eligible common
/// prefix, or when no ancestor qualifies.
pub fn grouping_root<S: SchemaLookup + ?Sized>(
    paths: &[&str],
    schema: &S,
    kind: RootKind,
) -> Option<String> {
    if paths.len() < 2 {
        return None;
    }
    let prefix = common_prefix(paths)?;
    std::iter::once(prefix.as_str())
        .chain(path::ancestors(&prefix))
        .find(|candidate| schema.lookup(candidate).is_some_and(|t| kind.accepts(t)))
        .map(str::to_string)
}

/// A reduced group member in the document emitter.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// A single primitive comparison, still eligible for grouping
    Clause(FieldClause),
    /// An already combined sub-query
    Query(DocumentQuery),
}

impl Member {
    pub fn into_query(self) -> DocumentQuery {
        match self {
            Member::Clause(clause) => DocumentQuery::Fields(vec![clause]),
            Member::Query(query) => query,
        }
    }
}

/// Combine the members of one group joined by `op`.
///
/// When every member is a primitive comparison and their attributes share
/// an array-valued ancestor, the comparisons are rewritten relative to that
/// ancestor and wrapped in an element match on it. Otherwise the members are
/// combined as they are.
pub fn resolve<S: SchemaLookup + ?Sized>(
    op: LogicalOp,
    members: Vec<Member>,
    schema: &S,
) -> DocumentQuery {
    let clauses: Option<Vec<&FieldClause>> = members
        .iter()
        .map(|member| match member {
            Member::Clause(clause) => Some(clause),
            Member::Query(_) => None,
        })
        .collect();

    let root = clauses.and_then(|clauses| {
        let paths: Vec<&str> = clauses.iter().map(|c| c.path.as_str()).collect();
        grouping_root(&paths, schema, RootKind::Array)
    });

    let Some(root) = root else {
        return DocumentQuery::combine(op, members.into_iter().map(Member::into_query).collect());
    };

    trace!(%root, members = members.len(), "Grouping clauses into element match");
    let relative = members
        .into_iter()
        .map(|member| match member {
            Member::Clause(clause) => DocumentQuery::Fields(vec![FieldClause {
                path: path::relative_to(&clause.path, &root).to_string(),
                condition: clause.condition,
            }]),
            Member::Query(query) => query,
        })
        .collect();

    DocumentQuery::Fields(vec![FieldClause {
        path: root,
        condition: Condition::ElementMatch(Box::new(DocumentQuery::combine(op, relative))),
    }])
}
