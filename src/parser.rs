use tracing::trace;

use crate::{
    ast::{Criteria, LogicalNode, LogicalOp, Node, Rule, Separator},
    error::{CompileError, EmissionReason, Result, StructuralReason},
};

/// Builds the prefix tree from a validated, coerced rule sequence.
///
/// The builder keeps a cursor (a path of child indices) into the tree under
/// construction. `BEGIN` opens a group below the cursor and descends into it,
/// `END` closes the current group and climbs back up, a logical sets the
/// current group's connective, and a criteria is appended as a leaf.
///
/// # Examples
///
/// ```
/// use rules_query::{LogicalOp, Node, Relationship, Rule};
/// use rules_query::parser::Parser;
///
/// let rules = vec![
///     Rule::begin(),
///     Rule::criteria("type", Relationship::Eq, "book"),
///     Rule::or(),
///     Rule::criteria("type", Relationship::Eq, "journal"),
///     Rule::end(),
/// ];
///
/// let tree = Parser::new(&rules).parse().unwrap();
/// match tree {
///     Node::Logical(group) => {
///         assert_eq!(group.operator, LogicalOp::Or);
///         assert_eq!(group.children.len(), 2);
///     }
///     _ => panic!("expected a logical root"),
/// }
/// ```
pub struct Parser<'a> {
    rules: &'a [Rule],
    forest: Vec<PendingGroup>,
    cursor: Vec<usize>,
}

/// A group whose connective is not known until its `END`.
#[derive(Debug, Default)]
struct PendingGroup {
    operator: Option<LogicalOp>,
    children: Vec<PendingNode>,
}

#[derive(Debug)]
enum PendingNode {
    Group(PendingGroup),
    Criteria(Criteria),
}

impl<'a> Parser<'a> {
    pub fn new(rules: &'a [Rule]) -> Self {
        Parser {
            rules,
            forest: Vec::new(),
            cursor: Vec::new(),
        }
    }

    /// Group the cursor points at, or `None` outside every group.
    fn current(&mut self) -> Option<&mut PendingGroup> {
        let (first, rest) = self.cursor.split_first()?;
        let mut group = self.forest.get_mut(*first)?;
        for &index in rest {
            group = match group.children.get_mut(index)? {
                PendingNode::Group(child) => child,
                PendingNode::Criteria(_) => return None,
            };
        }
        Some(group)
    }

    fn open_group(&mut self) {
        match self.current() {
            None => {
                self.forest.push(PendingGroup::default());
                self.cursor = vec![self.forest.len() - 1];
            }
            Some(parent) => {
                parent.children.push(PendingNode::Group(PendingGroup::default()));
                let index = parent.children.len() - 1;
                self.cursor.push(index);
            }
        }
    }

    fn close_group(&mut self, index: usize) -> Result<()> {
        let group = self.current().ok_or_else(|| {
            CompileError::structural_at(StructuralReason::UnbalancedSeparators, index)
        })?;
        // An explicit connective needs two children to join
        if group.operator.is_some() && group.children.len() < 2 {
            return Err(CompileError::emission(EmissionReason::MinimumCriteria));
        }
        // A group without any logical (a single criteria) conjoins implicitly
        group.operator.get_or_insert(LogicalOp::And);
        self.cursor.pop();
        Ok(())
    }

    fn set_operator(&mut self, op: LogicalOp, index: usize) -> Result<()> {
        let group = self
            .current()
            .ok_or_else(|| CompileError::structural_at(StructuralReason::ImproperOrder, index))?;
        match group.operator {
            Some(existing) if existing != op => Err(CompileError::structural_at(
                StructuralReason::MixedLogicalOperators,
                index,
            )),
            _ => {
                group.operator = Some(op);
                Ok(())
            }
        }
    }

    fn push_criteria(&mut self, criteria: &Criteria, index: usize) -> Result<()> {
        let group = self
            .current()
            .ok_or_else(|| CompileError::structural_at(StructuralReason::ImproperOrder, index))?;
        group.children.push(PendingNode::Criteria(criteria.clone()));
        Ok(())
    }

    /// Consume the rules and return the single root group.
    pub fn parse(mut self) -> Result<Node> {
        let rules = self.rules;
        for (index, rule) in rules.iter().enumerate() {
            match rule {
                Rule::Separator(Separator::Begin) => self.open_group(),
                Rule::Separator(Separator::End) => self.close_group(index)?,
                Rule::Logical(op) => self.set_operator(*op, index)?,
                Rule::Criteria(criteria) => self.push_criteria(criteria, index)?,
            }
        }

        if !self.cursor.is_empty() {
            return Err(CompileError::structural(
                StructuralReason::UnbalancedSeparators,
            ));
        }

        let mut forest = self.forest.into_iter();
        match (forest.next(), forest.next()) {
            (Some(root), None) => {
                let tree = Node::Logical(root.finish());
                trace!(?tree, "Prefix tree built");
                Ok(tree)
            }
            (None, _) => Err(CompileError::structural(
                StructuralReason::UnbalancedSeparators,
            )),
            (Some(_), Some(_)) => Err(CompileError::structural(StructuralReason::MultipleRoots)),
        }
    }
}

impl PendingGroup {
    fn finish(self) -> LogicalNode {
        LogicalNode {
            operator: self.operator.unwrap_or(LogicalOp::And),
            children: self
                .children
                .into_iter()
                .map(|child| match child {
                    PendingNode::Group(group) => Node::Logical(group.finish()),
                    PendingNode::Criteria(criteria) => Node::Criteria(criteria),
                })
                .collect(),
        }
    }
}

/// Build the prefix tree for `rules`.
pub fn build(rules: &[Rule]) -> Result<Node> {
    Parser::new(rules).parse()
}
