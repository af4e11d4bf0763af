use serde::{Deserialize, Serialize};

use crate::ast::{LogicalOp, Relationship, Separator};
use crate::value::Literal;

pub const SEPARATOR_TYPE: &str = "separator";
pub const LOGICAL_TYPE: &str = "logical";
pub const CRITERIA_TYPE: &str = "criteria";

/// A rule exactly as it arrives on the wire.
///
/// Every field is optional so that decoding never fails on shape alone;
/// the validator turns a `RawRule` into a typed [`Rule`] and reports what
/// is missing or wrong.
///
/// # Examples
/// ```text
/// {"type": "separator", "value": "BEGIN"}
/// {"type": "logical", "value": "AND"}
/// {"type": "criteria", "attribute": "prices.price", "relationship": "GT", "value": 10}
/// {"type": "criteria", "attribute": "type", "relationship": "IN", "values": ["book", "journal"]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRule {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<serde_json::Value>,
}

impl RawRule {
    pub fn separator(separator: Separator) -> Self {
        RawRule {
            kind: Some(SEPARATOR_TYPE.to_string()),
            value: Some(serde_json::Value::String(separator.as_str().to_string())),
            ..Default::default()
        }
    }

    pub fn logical(op: LogicalOp) -> Self {
        RawRule {
            kind: Some(LOGICAL_TYPE.to_string()),
            value: Some(serde_json::Value::String(op.as_str().to_string())),
            ..Default::default()
        }
    }
}

impl From<&Rule> for RawRule {
    fn from(rule: &Rule) -> Self {
        match rule {
            Rule::Separator(separator) => RawRule::separator(*separator),
            Rule::Logical(op) => RawRule::logical(*op),
            Rule::Criteria(criteria) => {
                let (value, values) = match &criteria.operand {
                    Operand::Value(v) => (Some(v.to_json()), None),
                    Operand::Values(vs) => (
                        None,
                        Some(serde_json::Value::Array(
                            vs.iter().map(Literal::to_json).collect(),
                        )),
                    ),
                };
                RawRule {
                    kind: Some(CRITERIA_TYPE.to_string()),
                    attribute: Some(criteria.attribute.clone()),
                    relationship: Some(criteria.relationship.as_str().to_string()),
                    value,
                    values,
                }
            }
        }
    }
}

/// One step of a validated rule sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// `BEGIN` / `END` grouping marker
    Separator(Separator),

    /// `AND` / `OR` between two sibling clauses
    Logical(LogicalOp),

    /// A single attribute comparison
    Criteria(Criteria),
}

impl Rule {
    pub fn begin() -> Self {
        Rule::Separator(Separator::Begin)
    }

    pub fn end() -> Self {
        Rule::Separator(Separator::End)
    }

    pub fn and() -> Self {
        Rule::Logical(LogicalOp::And)
    }

    pub fn or() -> Self {
        Rule::Logical(LogicalOp::Or)
    }

    /// Scalar comparison, e.g. `type EQ "book"`.
    pub fn criteria(
        attribute: impl Into<String>,
        relationship: Relationship,
        value: impl Into<Literal>,
    ) -> Self {
        Rule::Criteria(Criteria::new(
            attribute,
            relationship,
            Operand::Value(value.into()),
        ))
    }

    /// Set comparison, e.g. `availability.status NI ["DRM_PROTECTED"]`.
    pub fn criteria_set<L: Into<Literal>>(
        attribute: impl Into<String>,
        relationship: Relationship,
        values: impl IntoIterator<Item = L>,
    ) -> Self {
        Rule::Criteria(Criteria::new(
            attribute,
            relationship,
            Operand::Values(values.into_iter().map(Into::into).collect()),
        ))
    }
}

/// A comparison between an attribute and one or more literals.
#[derive(Debug, Clone, PartialEq)]
pub struct Criteria {
    /// Dotted attribute path, optionally with one `[key:value]` element filter
    pub attribute: String,

    pub relationship: Relationship,

    pub operand: Operand,

    /// Set by coercion for the search target: the emitted field name gets the
    /// exact-match suffix.
    pub exact_match: bool,
}

impl Criteria {
    pub fn new(attribute: impl Into<String>, relationship: Relationship, operand: Operand) -> Self {
        Criteria {
            attribute: attribute.into(),
            relationship,
            operand,
            exact_match: false,
        }
    }
}

/// The literal side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Scalar relationships: EQ, NE, GT, LT, GE, LE, LIKE, PREFIX
    Value(Literal),

    /// Set relationships: IN, NI, ALL
    Values(Vec<Literal>),
}

impl Operand {
    pub fn literals(&self) -> &[Literal] {
        match self {
            Operand::Value(v) => std::slice::from_ref(v),
            Operand::Values(vs) => vs,
        }
    }
}
