//! Search-engine query emitter.
//!
//! Walks the prefix tree and builds an Elasticsearch-style bool query:
//!
//! | Relationship | Leaf                                  |
//! |--------------|---------------------------------------|
//! | `EQ`         | `term`                                |
//! | `NE`         | `bool.must_not` around the `EQ` leaf  |
//! | `GT` ... `LE`| `range`                               |
//! | `IN`         | `terms`                               |
//! | `NI`         | `bool.must_not` around the `IN` leaf  |
//! | `ALL`        | `terms_set` requiring every term      |
//! | `LIKE`       | `match`                               |
//! | `PREFIX`     | `prefix`                              |
//!
//! Leaves below an array of sub-documents are wrapped in `nested` queries.
//! `AND` becomes `must` when any leaf is full-text (the query is scored) and
//! `filter` otherwise; `OR` becomes `should`.

use tracing::{debug, trace};

use crate::{
    ast::{Criteria, LogicalNode, LogicalOp, Node, Operand, Relationship, Rule},
    coercion::emitted_filter,
    config::CompilerConfig,
    error::{CompileError, EmissionReason, Result},
    grouping::{RootKind, grouping_root},
    path::AttributePath,
    schema::SchemaLookup,
    value::Literal,
};

/// Compiled search-engine query.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchQuery {
    MatchAll,
    Term { field: String, value: Literal },
    Terms { field: String, values: Vec<Literal> },
    /// Every listed term must be present
    TermsSet { field: String, values: Vec<Literal> },
    Match { field: String, value: Literal },
    Prefix { field: String, value: String },
    Range {
        field: String,
        bound: RangeBound,
        value: Literal,
    },
    Nested { path: String, query: Box<SearchQuery> },
    Bool(BoolQuery),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Gt,
    Lt,
    Gte,
    Lte,
}

impl RangeBound {
    pub fn as_str(self) -> &'static str {
        match self {
            RangeBound::Gt => "gt",
            RangeBound::Lt => "lt",
            RangeBound::Gte => "gte",
            RangeBound::Lte => "lte",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<SearchQuery>,
    pub filter: Vec<SearchQuery>,
    pub should: Vec<SearchQuery>,
    pub must_not: Vec<SearchQuery>,
}

impl BoolQuery {
    pub fn must_not(queries: Vec<SearchQuery>) -> Self {
        BoolQuery {
            must_not: queries,
            ..Default::default()
        }
    }
}

/// Whether any criteria in `rules` is full-text, which makes the whole query
/// scored.
pub fn requires_scoring(rules: &[Rule]) -> bool {
    rules
        .iter()
        .any(|rule| matches!(rule, Rule::Criteria(c) if c.relationship.is_full_text()))
}

/// Recursive-descent emitter over the prefix tree.
pub struct SearchEmitter<'a, S: ?Sized> {
    schema: &'a S,
    config: &'a CompilerConfig,
    scoring: bool,
}

impl<'a, S: SchemaLookup + ?Sized> SearchEmitter<'a, S> {
    pub fn new(schema: &'a S, config: &'a CompilerConfig, scoring: bool) -> Self {
        SearchEmitter {
            schema,
            config,
            scoring,
        }
    }

    pub fn emit(&self, node: &Node) -> Result<SearchQuery> {
        match node {
            Node::Criteria(criteria) => self.criteria(criteria),
            Node::Logical(group) => self.logical(group),
        }
    }

    fn logical(&self, group: &LogicalNode) -> Result<SearchQuery> {
        if group.children.is_empty() {
            return Ok(SearchQuery::MatchAll);
        }

        if group.children.len() >= 2 {
            let leaves: Option<Vec<&Criteria>> =
                group.children.iter().map(Node::as_criteria).collect();
            if let Some(leaves) = leaves {
                if let Some(query) = self.combined_nested(group.operator, &leaves)? {
                    return Ok(query);
                }
            }
        }

        let children = group
            .children
            .iter()
            .map(|child| self.emit(child))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.compound(group.operator, children))
    }

    /// Combine sibling leaves that share a nested ancestor into one `nested`
    /// query on it, so they must match within the same sub-document.
    ///
    /// Returns `None` when there is no shared nested ancestor or a leaf
    /// carries an element filter.
    fn combined_nested(&self, op: LogicalOp, leaves: &[&Criteria]) -> Result<Option<SearchQuery>> {
        let paths = leaves
            .iter()
            .map(|c| AttributePath::parse(&c.attribute))
            .collect::<Result<Vec<_>>>()?;
        if paths.iter().any(|p| p.filter().is_some()) {
            return Ok(None);
        }

        let attributes: Vec<&str> = leaves.iter().map(|c| c.attribute.as_str()).collect();
        let Some(root) = grouping_root(&attributes, self.schema, RootKind::Nested) else {
            return Ok(None);
        };
        debug!(%root, leaves = leaves.len(), "Combining leaves into one nested query");

        let (negated, positive): (Vec<&Criteria>, Vec<&Criteria>) = leaves
            .iter()
            .copied()
            .partition(|c| c.relationship.polarity().negated);

        let positive_leaves = positive
            .iter()
            .map(|c| self.inner_leaf(c, &root))
            .collect::<Result<Vec<_>>>()?;

        let mut parts = Vec::with_capacity(negated.len() + 1);
        if !positive_leaves.is_empty() {
            parts.push(nested(&root, self.compound(op, positive_leaves.clone())));
        }

        for criteria in negated {
            let excluded = self.inner_leaf(criteria, &root)?;
            // Under OR the positive siblings say nothing about this element
            let paired = match op {
                LogicalOp::And => {
                    let mut members = positive_leaves.clone();
                    members.push(excluded);
                    self.compound(LogicalOp::And, members)
                }
                LogicalOp::Or => excluded,
            };
            parts.push(SearchQuery::Bool(BoolQuery::must_not(vec![nested(
                &root, paired,
            )])));
        }

        let combined = match parts.len() {
            1 => parts.remove(0),
            _ => self.compound(op, parts),
        };
        Ok(Some(self.wrap_nested(&root, combined)))
    }

    /// Positive leaf for `criteria`, wrapped in the nested ancestors that lie
    /// below `root`.
    fn inner_leaf(&self, criteria: &Criteria, root: &str) -> Result<SearchQuery> {
        let leaf = self.leaf(criteria, &criteria.attribute)?;
        let below_root = format!("{}.", root);
        Ok(self
            .schema
            .nested_ancestors(&criteria.attribute)
            .into_iter()
            .filter(|ancestor| ancestor.starts_with(&below_root))
            .rev()
            .fold(leaf, |query, ancestor| nested(&ancestor, query)))
    }

    fn criteria(&self, criteria: &Criteria) -> Result<SearchQuery> {
        let path = AttributePath::parse(&criteria.attribute)?;
        let schema_path = path.schema_path();
        let leaf = self.leaf(criteria, &schema_path)?;
        let negated = criteria.relationship.polarity().negated;
        trace!(attribute = %criteria.attribute, negated, "Emitting search leaf");

        let query = match self.element_filter(&path)? {
            Some(filter) if negated => SearchQuery::Bool(BoolQuery {
                filter: vec![filter],
                must_not: vec![leaf],
                ..Default::default()
            }),
            Some(filter) => SearchQuery::Bool(BoolQuery {
                filter: vec![filter, leaf],
                ..Default::default()
            }),
            None if negated => {
                return Ok(SearchQuery::Bool(BoolQuery::must_not(vec![
                    self.wrap_nested(&schema_path, leaf),
                ])));
            }
            None => leaf,
        };
        Ok(self.wrap_nested(&schema_path, query))
    }

    /// Term on `<array>.<key>` selecting the filtered element.
    fn element_filter(&self, path: &AttributePath) -> Result<Option<SearchQuery>> {
        let (Some(array), Some(filter)) = (path.array_path(), path.filter()) else {
            return Ok(None);
        };
        let Some(value) = emitted_filter(path, self.schema)? else {
            return Ok(None);
        };
        let key_path = format!("{}.{}", array, filter.key);
        let exact = key_path != self.config.identity_field
            && self
                .schema
                .lookup(&key_path)
                .is_none_or(|declared| declared.is_plain_string());
        Ok(Some(SearchQuery::Term {
            field: self.field_name(&key_path, exact),
            value,
        }))
    }

    /// Leaf for the positive form of the criteria's relationship on `path`.
    fn leaf(&self, criteria: &Criteria, path: &str) -> Result<SearchQuery> {
        let field = self.field_name(path, criteria.exact_match);
        let shape_error = || {
            CompileError::emission(EmissionReason::OperandShape(
                criteria.relationship.to_string(),
            ))
        };
        let scalar = || match &criteria.operand {
            Operand::Value(value) => Ok(value.clone()),
            Operand::Values(_) => Err(shape_error()),
        };
        let set = || match &criteria.operand {
            Operand::Values(values) => Ok(values.clone()),
            Operand::Value(_) => Err(shape_error()),
        };
        let range = |bound| -> Result<SearchQuery> {
            Ok(SearchQuery::Range {
                field: field.clone(),
                bound,
                value: scalar()?,
            })
        };

        match criteria.relationship.polarity().positive {
            Relationship::Eq => Ok(SearchQuery::Term {
                field: field.clone(),
                value: scalar()?,
            }),
            Relationship::Gt => range(RangeBound::Gt),
            Relationship::Lt => range(RangeBound::Lt),
            Relationship::Ge => range(RangeBound::Gte),
            Relationship::Le => range(RangeBound::Lte),
            Relationship::In => Ok(SearchQuery::Terms {
                field: field.clone(),
                values: set()?,
            }),
            Relationship::All => Ok(SearchQuery::TermsSet {
                field: field.clone(),
                values: set()?,
            }),
            Relationship::Like => Ok(SearchQuery::Match {
                field: field.clone(),
                value: scalar()?,
            }),
            Relationship::Prefix => Ok(SearchQuery::Prefix {
                field: field.clone(),
                value: scalar()?.as_string(),
            }),
            other @ (Relationship::Ne | Relationship::Ni) => Err(CompileError::emission(
                EmissionReason::UnsupportedRelationship(other.to_string()),
            )),
        }
    }

    fn field_name(&self, path: &str, exact: bool) -> String {
        if exact {
            format!("{}{}", path, self.config.keyword_suffix)
        } else {
            path.to_string()
        }
    }

    /// Wrap `query` in every nested ancestor of `path`, outermost first.
    fn wrap_nested(&self, path: &str, query: SearchQuery) -> SearchQuery {
        self.schema
            .nested_ancestors(path)
            .into_iter()
            .rev()
            .fold(query, |query, ancestor| nested(&ancestor, query))
    }

    fn compound(&self, op: LogicalOp, queries: Vec<SearchQuery>) -> SearchQuery {
        let mut bool_query = BoolQuery::default();
        match op {
            LogicalOp::And if self.scoring => bool_query.must = queries,
            LogicalOp::And => bool_query.filter = queries,
            LogicalOp::Or => bool_query.should = queries,
        }
        SearchQuery::Bool(bool_query)
    }
}

fn nested(path: &str, query: SearchQuery) -> SearchQuery {
    SearchQuery::Nested {
        path: path.to_string(),
        query: Box::new(query),
    }
}
