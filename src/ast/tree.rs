use crate::ast::{Criteria, LogicalOp};

/// Node of the prefix tree built from a rule sequence.
///
/// The tree is rebuilt for every compile call and dropped after emission.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A `BEGIN .. END` group with its resolved connective
    Logical(LogicalNode),

    /// A single comparison (leaf)
    Criteria(Criteria),
}

/// A group of sibling clauses joined by one connective.
///
/// # Example
/// ```text
/// BEGIN type EQ "book" AND BEGIN a EQ 1 OR b EQ 2 END END
///
/// And
/// ├── type EQ "book"
/// └── Or
///     ├── a EQ 1
///     └── b EQ 2
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalNode {
    pub operator: LogicalOp,
    pub children: Vec<Node>,
}

impl Node {
    pub fn as_criteria(&self) -> Option<&Criteria> {
        match self {
            Node::Criteria(c) => Some(c),
            Node::Logical(_) => None,
        }
    }
}
