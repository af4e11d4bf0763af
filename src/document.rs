//! Document-store query emitter.
//!
//! Compiles a validated, coerced rule sequence into a MongoDB-style filter
//! document in two stages:
//!
//! 1. **Linearization** - separators become `(`/`)` slots, logicals become
//!    join slots, and every criteria becomes an indexed primitive clause in a
//!    side table:
//!
//!    ```text
//!    BEGIN type EQ "book" AND BEGIN a EQ 1 OR b EQ 2 END END
//!    ( 0 & ( 1 | 2 ) )
//!    ```
//!
//! 2. **Reduction** - the innermost group (last `(`, first `)` after it) is
//!    reduced to one member, through the grouped-query resolver when it has
//!    a connective, and spliced back in. This repeats until no group is left.
//!    A single member is the result; nothing at all means "match everything".

use regex::escape;
use tracing::{debug, trace};

use crate::{
    ast::{Criteria, LogicalOp, Operand, Relationship, Rule, Separator},
    coercion::emitted_filter,
    error::{CompileError, EmissionReason, Result, StructuralReason},
    grouping::{self, Member},
    path::AttributePath,
    schema::SchemaLookup,
    value::Literal,
};

/// Compiled document-store filter.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentQuery {
    /// `{}`
    MatchAll,
    /// `{"a": <cond>, "b": <cond>}`, an implicit conjunction of field clauses
    Fields(Vec<FieldClause>),
    /// `{"$and": [...]}`
    And(Vec<DocumentQuery>),
    /// `{"$or": [...]}`
    Or(Vec<DocumentQuery>),
}

impl DocumentQuery {
    pub fn combine(op: LogicalOp, queries: Vec<DocumentQuery>) -> Self {
        match op {
            LogicalOp::And => DocumentQuery::And(queries),
            LogicalOp::Or => DocumentQuery::Or(queries),
        }
    }
}

/// One field and the condition it must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldClause {
    pub path: String,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Bare value, `{"type": "netbase"}`
    Equals(Literal),
    /// `{"$gt": 10}`
    Compare { op: CompareOp, value: Literal },
    /// `{"$in": [...]}`
    Set { op: SetOp, values: Vec<Literal> },
    /// `{"$regex": "...", "$options": "i"}`
    Regex {
        pattern: String,
        case_insensitive: bool,
    },
    /// `{"$elemMatch": {...}}`
    ElementMatch(Box<DocumentQuery>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

impl CompareOp {
    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "$eq",
            CompareOp::Ne => "$ne",
            CompareOp::Gt => "$gt",
            CompareOp::Lt => "$lt",
            CompareOp::Gte => "$gte",
            CompareOp::Lte => "$lte",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    In,
    Nin,
    All,
}

impl SetOp {
    pub fn as_str(self) -> &'static str {
        match self {
            SetOp::In => "$in",
            SetOp::Nin => "$nin",
            SetOp::All => "$all",
        }
    }
}

/// One slot of the linearized template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Open,
    Close,
    Join(LogicalOp),
    Member(usize),
}

/// Compile a validated and coerced rule sequence.
///
/// # Examples
///
/// ```
/// use rules_query::{document, AttributeType, Relationship, Rule, Schema};
/// use rules_query::output::document_to_json;
/// use serde_json::json;
///
/// let schema = Schema::new()
///     .with("type", AttributeType::string())
///     .with("book.format", AttributeType::string());
///
/// let rules = vec![
///     Rule::begin(),
///     Rule::criteria("type", Relationship::Eq, "book"),
///     Rule::and(),
///     Rule::criteria("book.format", Relationship::Eq, "EBK"),
///     Rule::end(),
/// ];
///
/// let query = document::emit(&rules, &schema).unwrap();
/// assert_eq!(
///     document_to_json(&query),
///     json!({"$and": [{"type": {"$eq": "book"}}, {"book.format": {"$eq": "EBK"}}]})
/// );
/// ```
pub fn emit<S: SchemaLookup + ?Sized>(rules: &[Rule], schema: &S) -> Result<DocumentQuery> {
    let (mut template, clauses) = linearize(rules, schema)?;
    let mut members: Vec<Option<Member>> = clauses.into_iter().map(Some).collect();
    debug!(slots = template.len(), clauses = members.len(), "Reducing document template");

    while let Some(open) = template.iter().rposition(|slot| *slot == Slot::Open) {
        let close = template[open..]
            .iter()
            .position(|slot| *slot == Slot::Close)
            .map(|offset| open + offset)
            .ok_or_else(|| CompileError::structural(StructuralReason::UnbalancedSeparators))?;

        let reduced = reduce_group(&template[open + 1..close], &mut members, schema)?;
        trace!(open, close, ?reduced, "Reduced group");
        template.splice(open..=close, reduced.map(Slot::Member));
    }

    match template.as_slice() {
        [] => Ok(DocumentQuery::MatchAll),
        [Slot::Member(index)] => take_member(&mut members, *index).map(Member::into_query),
        _ => Err(CompileError::emission(EmissionReason::MalformedTemplate)),
    }
}

/// Stage 1: template slots plus the side table of primitive clauses.
fn linearize<S: SchemaLookup + ?Sized>(
    rules: &[Rule],
    schema: &S,
) -> Result<(Vec<Slot>, Vec<Member>)> {
    let mut template = Vec::with_capacity(rules.len());
    let mut clauses = Vec::new();

    for rule in rules {
        match rule {
            Rule::Separator(Separator::Begin) => template.push(Slot::Open),
            Rule::Separator(Separator::End) => template.push(Slot::Close),
            Rule::Logical(op) => template.push(Slot::Join(*op)),
            Rule::Criteria(criteria) => {
                template.push(Slot::Member(clauses.len()));
                clauses.push(Member::Clause(primitive_clause(criteria, schema)?));
            }
        }
    }
    Ok((template, clauses))
}

/// Reduce the contents of one innermost group to at most one member.
fn reduce_group<S: SchemaLookup + ?Sized>(
    inner: &[Slot],
    members: &mut Vec<Option<Member>>,
    schema: &S,
) -> Result<Option<usize>> {
    let mut indices = Vec::new();
    let mut join: Option<LogicalOp> = None;

    for slot in inner {
        match slot {
            Slot::Member(index) => indices.push(*index),
            Slot::Join(op) => match join {
                Some(existing) if existing != *op => {
                    return Err(CompileError::structural(
                        StructuralReason::MixedLogicalOperators,
                    ));
                }
                _ => join = Some(*op),
            },
            Slot::Open | Slot::Close => {
                return Err(CompileError::emission(EmissionReason::MalformedTemplate));
            }
        }
    }

    match (join, indices.as_slice()) {
        (Some(_), [] | [_]) => Err(CompileError::emission(EmissionReason::MinimumCriteria)),
        (Some(op), _) => {
            let group = indices
                .iter()
                .map(|index| take_member(members, *index))
                .collect::<Result<Vec<_>>>()?;
            let combined = grouping::resolve(op, group, schema);
            members.push(Some(Member::Query(combined)));
            Ok(Some(members.len() - 1))
        }
        (None, []) => Ok(None),
        (None, [index]) => Ok(Some(*index)),
        (None, _) => Err(CompileError::emission(EmissionReason::MalformedTemplate)),
    }
}

fn take_member(members: &mut [Option<Member>], index: usize) -> Result<Member> {
    members
        .get_mut(index)
        .and_then(Option::take)
        .ok_or_else(|| CompileError::emission(EmissionReason::MalformedTemplate))
}

/// Translate one criteria into a field clause.
///
/// An element-filtered attribute becomes an element match on the filtered
/// array: `a[k:v].b EQ 1` -> `{"a": {"$elemMatch": {"k": v, "b": {"$eq": 1}}}}`.
pub fn primitive_clause<S: SchemaLookup + ?Sized>(
    criteria: &Criteria,
    schema: &S,
) -> Result<FieldClause> {
    let condition = condition_for(criteria.relationship, &criteria.operand)?;
    let path = AttributePath::parse(&criteria.attribute)?;

    match (path.array_path(), path.element_path(), path.filter()) {
        (Some(array), Some(element), Some(filter)) => {
            let filter_value = emitted_filter(&path, schema)?
                .unwrap_or_else(|| Literal::String(filter.value.clone()));
            let selector = FieldClause {
                path: filter.key.clone(),
                condition: Condition::Equals(filter_value),
            };
            let compared = FieldClause {
                path: element,
                condition,
            };
            // One object cannot hold the same key twice
            let matched = if selector.path == compared.path {
                DocumentQuery::And(vec![
                    DocumentQuery::Fields(vec![selector]),
                    DocumentQuery::Fields(vec![compared]),
                ])
            } else {
                DocumentQuery::Fields(vec![selector, compared])
            };
            Ok(FieldClause {
                path: array,
                condition: Condition::ElementMatch(Box::new(matched)),
            })
        }
        _ => Ok(FieldClause {
            path: criteria.attribute.clone(),
            condition,
        }),
    }
}

fn condition_for(relationship: Relationship, operand: &Operand) -> Result<Condition> {
    let polarity = relationship.polarity();
    let shape_error = || {
        CompileError::emission(EmissionReason::OperandShape(relationship.to_string()))
    };
    let scalar = || match operand {
        Operand::Value(value) => Ok(value.clone()),
        Operand::Values(_) => Err(shape_error()),
    };
    let compare = |op| -> Result<Condition> { Ok(Condition::Compare { op, value: scalar()? }) };
    let set = |op| match operand {
        Operand::Values(values) => Ok(Condition::Set {
            op,
            values: values.clone(),
        }),
        Operand::Value(_) => Err(shape_error()),
    };

    match (polarity.positive, polarity.negated) {
        (Relationship::Eq, false) => compare(CompareOp::Eq),
        (Relationship::Eq, true) => compare(CompareOp::Ne),
        (Relationship::Gt, _) => compare(CompareOp::Gt),
        (Relationship::Lt, _) => compare(CompareOp::Lt),
        (Relationship::Ge, _) => compare(CompareOp::Gte),
        (Relationship::Le, _) => compare(CompareOp::Lte),
        (Relationship::In, false) => set(SetOp::In),
        (Relationship::In, true) => set(SetOp::Nin),
        (Relationship::All, _) => set(SetOp::All),
        (Relationship::Like, _) => Ok(Condition::Regex {
            pattern: escape(&scalar()?.as_string()),
            case_insensitive: true,
        }),
        (Relationship::Prefix, _) => Ok(Condition::Regex {
            pattern: format!("^{}", escape(&scalar()?.as_string())),
            case_insensitive: false,
        }),
        (other @ (Relationship::Ne | Relationship::Ni), _) => Err(CompileError::emission(
            EmissionReason::UnsupportedRelationship(other.to_string()),
        )),
    }
}
