use serde::{Deserialize, Serialize};

use crate::ast::RawRule;

pub const GROUP_TYPE: &str = "group";

/// One filter request: a product type and the rules that select it.
///
/// `rules` is either a plain rule sequence or a list of named groups, never
/// a mix of both.
///
/// # Example
/// ```text
/// {
///   "type": "book",
///   "rules": [
///     {"type": "separator", "value": "BEGIN"},
///     {"type": "criteria", "attribute": "book.format", "relationship": "EQ", "value": "EBK"},
///     {"type": "separator", "value": "END"}
///   ],
///   "attributes": ["title", "isbn"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    #[serde(rename = "type")]
    pub product_type: String,

    pub rules: Vec<RuleEntry>,

    /// Projection, passed through untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,
}

impl QuerySpec {
    pub fn new(product_type: impl Into<String>, rules: Vec<RawRule>) -> Self {
        QuerySpec {
            product_type: product_type.into(),
            rules: rules.into_iter().map(RuleEntry::Rule).collect(),
            attributes: None,
        }
    }

    pub fn grouped(product_type: impl Into<String>, groups: Vec<RuleGroup>) -> Self {
        QuerySpec {
            product_type: product_type.into(),
            rules: groups.into_iter().map(RuleEntry::Group).collect(),
            attributes: None,
        }
    }
}

/// An element of `QuerySpec::rules`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleEntry {
    Group(RuleGroup),
    Rule(RawRule),
}

/// Independently written rule sequence, ANDed with its sibling groups.
///
/// # Example
/// ```text
/// {"name": "availability", "type": "group", "rules": [ ... ]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleGroup {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub rules: Vec<RawRule>,
}

impl RuleGroup {
    pub fn new(name: impl Into<String>, rules: Vec<RawRule>) -> Self {
        RuleGroup {
            name: name.into(),
            kind: GROUP_TYPE.to_string(),
            rules,
        }
    }
}
