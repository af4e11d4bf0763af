use rules_query::{
    CompileError, Criteria, EmissionReason, LogicalNode, LogicalOp, Node, Operand, Relationship, Rule,
    StructuralReason,
    parser::{Parser, build},
};

fn leaf(attribute: &str, value: &str) -> Node {
    Node::Criteria(Criteria::new(
        attribute,
        Relationship::Eq,
        Operand::Value(value.into()),
    ))
}

fn group(operator: LogicalOp, children: Vec<Node>) -> Node {
    Node::Logical(LogicalNode { operator, children })
}

fn structural_reason(rules: &[Rule]) -> (StructuralReason, Option<usize>) {
    match build(rules) {
        Err(CompileError::Structural { reason, rule }) => (reason, rule),
        other => panic!("expected a structural error, got {:?}", other),
    }
}

// ============================================================================
// Tree shape
// ============================================================================

#[test]
fn test_single_criteria_defaults_to_and() {
    let rules = vec![
        Rule::begin(),
        Rule::criteria("type", Relationship::Eq, "book"),
        Rule::end(),
    ];
    assert_eq!(
        build(&rules).unwrap(),
        group(LogicalOp::And, vec![leaf("type", "book")])
    );
}

#[test]
fn test_or_group() {
    let rules = vec![
        Rule::begin(),
        Rule::criteria("type", Relationship::Eq, "book"),
        Rule::or(),
        Rule::criteria("type", Relationship::Eq, "journal"),
        Rule::or(),
        Rule::criteria("type", Relationship::Eq, "audio"),
        Rule::end(),
    ];
    assert_eq!(
        Parser::new(&rules).parse().unwrap(),
        group(
            LogicalOp::Or,
            vec![
                leaf("type", "book"),
                leaf("type", "journal"),
                leaf("type", "audio"),
            ]
        )
    );
}

#[test]
fn test_nested_groups() {
    let rules = vec![
        Rule::begin(),
        Rule::criteria("type", Relationship::Eq, "book"),
        Rule::and(),
        Rule::begin(),
        Rule::criteria("format", Relationship::Eq, "EBK"),
        Rule::or(),
        Rule::criteria("format", Relationship::Eq, "PBK"),
        Rule::end(),
        Rule::and(),
        Rule::criteria("lang", Relationship::Eq, "en"),
        Rule::end(),
    ];
    assert_eq!(
        build(&rules).unwrap(),
        group(
            LogicalOp::And,
            vec![
                leaf("type", "book"),
                group(
                    LogicalOp::Or,
                    vec![leaf("format", "EBK"), leaf("format", "PBK")]
                ),
                leaf("lang", "en"),
            ]
        )
    );
}

#[test]
fn test_deeply_nested_single_children() {
    let rules = vec![
        Rule::begin(),
        Rule::begin(),
        Rule::begin(),
        Rule::criteria("type", Relationship::Eq, "book"),
        Rule::end(),
        Rule::end(),
        Rule::end(),
    ];
    assert_eq!(
        build(&rules).unwrap(),
        group(
            LogicalOp::And,
            vec![group(
                LogicalOp::And,
                vec![group(LogicalOp::And, vec![leaf("type", "book")])]
            )]
        )
    );
}

#[test]
fn test_empty_group() {
    let rules = vec![Rule::begin(), Rule::end()];
    assert_eq!(build(&rules).unwrap(), group(LogicalOp::And, vec![]));
}

#[test]
fn test_leading_subgroup() {
    let rules = vec![
        Rule::begin(),
        Rule::begin(),
        Rule::criteria("a", Relationship::Eq, "1"),
        Rule::or(),
        Rule::criteria("b", Relationship::Eq, "2"),
        Rule::end(),
        Rule::and(),
        Rule::criteria("c", Relationship::Eq, "3"),
        Rule::end(),
    ];
    assert_eq!(
        build(&rules).unwrap(),
        group(
            LogicalOp::And,
            vec![
                group(LogicalOp::Or, vec![leaf("a", "1"), leaf("b", "2")]),
                leaf("c", "3"),
            ]
        )
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_mixed_operators_in_group() {
    let rules = vec![
        Rule::begin(),
        Rule::criteria("a", Relationship::Eq, "1"),
        Rule::and(),
        Rule::criteria("b", Relationship::Eq, "2"),
        Rule::or(),
        Rule::criteria("c", Relationship::Eq, "3"),
        Rule::end(),
    ];
    let (reason, rule) = structural_reason(&rules);
    assert_eq!(reason, StructuralReason::MixedLogicalOperators);
    assert_eq!(rule, Some(4));
}

#[test]
fn test_same_operator_in_sibling_groups_allowed() {
    let rules = vec![
        Rule::begin(),
        Rule::begin(),
        Rule::criteria("a", Relationship::Eq, "1"),
        Rule::or(),
        Rule::criteria("b", Relationship::Eq, "2"),
        Rule::end(),
        Rule::and(),
        Rule::begin(),
        Rule::criteria("c", Relationship::Eq, "3"),
        Rule::or(),
        Rule::criteria("d", Relationship::Eq, "4"),
        Rule::end(),
        Rule::end(),
    ];
    assert!(build(&rules).is_ok());
}

#[test]
fn test_multiple_roots() {
    let rules = vec![
        Rule::begin(),
        Rule::criteria("a", Relationship::Eq, "1"),
        Rule::end(),
        Rule::begin(),
        Rule::criteria("b", Relationship::Eq, "2"),
        Rule::end(),
    ];
    let (reason, _) = structural_reason(&rules);
    assert_eq!(reason, StructuralReason::MultipleRoots);
}

#[test]
fn test_unclosed_group() {
    let rules = vec![Rule::begin(), Rule::criteria("a", Relationship::Eq, "1")];
    let (reason, _) = structural_reason(&rules);
    assert_eq!(reason, StructuralReason::UnbalancedSeparators);
}

#[test]
fn test_end_without_begin() {
    let rules = vec![Rule::end()];
    let (reason, rule) = structural_reason(&rules);
    assert_eq!(reason, StructuralReason::UnbalancedSeparators);
    assert_eq!(rule, Some(0));
}

#[test]
fn test_criteria_outside_group() {
    let rules = vec![Rule::criteria("a", Relationship::Eq, "1")];
    let (reason, rule) = structural_reason(&rules);
    assert_eq!(reason, StructuralReason::ImproperOrder);
    assert_eq!(rule, Some(0));
}

#[test]
fn test_no_rules() {
    let (reason, _) = structural_reason(&[]);
    assert_eq!(reason, StructuralReason::UnbalancedSeparators);
}

#[test]
fn test_connective_with_single_child() {
    let rules = vec![
        Rule::begin(),
        Rule::and(),
        Rule::criteria("a", Relationship::Eq, "1"),
        Rule::end(),
    ];
    assert!(matches!(
        build(&rules),
        Err(CompileError::Emission {
            reason: EmissionReason::MinimumCriteria
        })
    ));
}
