//! Property-based tests for coercion and rule ordering.
//!
//! Run with: `cargo test --test proptest_properties`

use proptest::prelude::*;

use rules_query::{
    AttributeType, Literal, Relationship, Rule, Schema, Separator,
    coercion::coerce_literal,
    document, parser,
    validator::{check_order, validate},
    value::format_date,
};

// =============================================================================
// Strategies
// =============================================================================

/// `YYYY-MM-DDTHH:mm:ss.sssZ` strings that name a real instant
fn iso_date_strategy() -> impl Strategy<Value = String> {
    (
        1970u32..2100,
        1u32..=12,
        1u32..=28,
        0u32..24,
        0u32..60,
        0u32..60,
        0u32..1000,
    )
        .prop_map(|(y, mo, d, h, mi, s, ms)| {
            format!(
                "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
                y, mo, d, h, mi, s, ms
            )
        })
}

fn literal_strategy() -> impl Strategy<Value = Literal> {
    prop_oneof![
        any::<bool>().prop_map(Literal::Boolean),
        any::<i64>().prop_map(Literal::Integer),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Literal::Float),
        "-?[0-9]{1,9}(\\.[0-9]{1,4})?".prop_map(Literal::String),
        "(?i)(true|false)".prop_map(Literal::String),
        iso_date_strategy().prop_map(Literal::String),
        ".*".prop_map(Literal::String),
    ]
}

fn attribute_type_strategy() -> impl Strategy<Value = AttributeType> {
    prop_oneof![
        Just(AttributeType::number()),
        Just(AttributeType::boolean()),
        Just(AttributeType::date()),
        Just(AttributeType::string()),
    ]
}

/// Well-formed groups: BEGIN, members joined by one logical, END
fn group_strategy() -> impl Strategy<Value = Vec<Rule>> {
    let leaf = Just(vec![Rule::criteria("pages", Relationship::Gt, 1i64)]);

    leaf.prop_recursive(
        4,  // depth
        32, // max nodes
        4,  // members per group
        |inner| {
            (prop::collection::vec(inner, 0..4), any::<bool>()).prop_map(|(members, or)| {
                let join = if or { Rule::or() } else { Rule::and() };
                let mut rules = vec![Rule::begin()];
                for (i, member) in members.into_iter().enumerate() {
                    if i > 0 {
                        rules.push(join.clone());
                    }
                    rules.extend(member);
                }
                rules.push(Rule::end());
                rules
            })
        },
    )
    .prop_map(|body| {
        let mut rules = vec![Rule::begin()];
        rules.extend(body);
        rules.push(Rule::end());
        rules
    })
}

fn token_strategy() -> impl Strategy<Value = Rule> {
    prop_oneof![
        Just(Rule::begin()),
        Just(Rule::end()),
        Just(Rule::and()),
        Just(Rule::or()),
        Just(Rule::criteria("pages", Relationship::Eq, 1i64)),
    ]
}

fn count(rules: &[Rule], separator: Separator) -> usize {
    rules
        .iter()
        .filter(|r| matches!(r, Rule::Separator(s) if *s == separator))
        .count()
}

fn schema() -> Schema {
    Schema::new().with("pages", AttributeType::number())
}

// =============================================================================
// Coercion
// =============================================================================

proptest! {
    #[test]
    fn coercion_is_idempotent(value in literal_strategy(), declared in attribute_type_strategy()) {
        if let Ok(once) = coerce_literal(&value, &declared) {
            let twice = coerce_literal(&once, &declared);
            prop_assert_eq!(twice, Ok(once));
        }
    }

    #[test]
    fn dates_round_trip(date in iso_date_strategy()) {
        let coerced = coerce_literal(&Literal::String(date.clone()), &AttributeType::date());
        match coerced {
            Ok(Literal::Date(instant)) => prop_assert_eq!(format_date(&instant), date),
            other => prop_assert!(false, "{} did not coerce to a date: {:?}", date, other),
        }
    }

    #[test]
    fn integers_coerce_to_themselves(n in any::<i64>()) {
        prop_assert_eq!(
            coerce_literal(&Literal::String(n.to_string()), &AttributeType::number()),
            Ok(Literal::Integer(n))
        );
    }
}

// =============================================================================
// Ordering and grouping
// =============================================================================

proptest! {
    #[test]
    fn accepted_sequences_are_balanced(rules in prop::collection::vec(token_strategy(), 0..16)) {
        if check_order(&rules).is_ok() {
            prop_assert_eq!(count(&rules, Separator::Begin), count(&rules, Separator::End));
        }
    }

    #[test]
    fn well_formed_groups_compile(rules in group_strategy()) {
        prop_assert!(check_order(&rules).is_ok());
        prop_assert!(validate(&rules, &schema()).is_ok());
        prop_assert_eq!(count(&rules, Separator::Begin), count(&rules, Separator::End));
        prop_assert!(parser::build(&rules).is_ok());
    }

    #[test]
    fn well_formed_groups_never_panic_in_document_emitter(rules in group_strategy()) {
        // Empty subgroups may leave a join with one member, which is an error, not a panic
        let _ = document::emit(&rules, &schema());
    }
}
