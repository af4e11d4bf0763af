use rules_query::{
    AttributeType, CompileError, CompilerConfig, Criteria, ExpectedType, Literal, Relationship,
    Rule, Schema,
    coercion::{coerce, coerce_literal, filter_literal},
    path::AttributePath,
    value::format_date,
};

fn schema() -> Schema {
    Schema::new()
        .with("_id", AttributeType::string())
        .with("type", AttributeType::string())
        .with("title", AttributeType::string())
        .with("pages", AttributeType::number())
        .with("drm", AttributeType::boolean())
        .with("publishedAt", AttributeType::date())
        .with("classifications", AttributeType::nested())
        .with("classifications.type", AttributeType::string())
        .with("classifications.code", AttributeType::string())
        .with("variants", AttributeType::nested())
        .with("variants.size", AttributeType::number())
        .with("variants.sku", AttributeType::string())
}

fn criteria_of(rule: &Rule) -> &Criteria {
    match rule {
        Rule::Criteria(c) => c,
        other => panic!("expected criteria, got {:?}", other),
    }
}

// ============================================================================
// Literal conversion
// ============================================================================

#[test]
fn test_number_from_string() {
    let number = AttributeType::number();
    assert_eq!(
        coerce_literal(&"100".into(), &number),
        Ok(Literal::Integer(100))
    );
    assert_eq!(
        coerce_literal(&" 42 ".into(), &number),
        Ok(Literal::Integer(42))
    );
    assert_eq!(
        coerce_literal(&"9.50".into(), &number),
        Ok(Literal::Float(9.5))
    );
    assert_eq!(
        coerce_literal(&"-3".into(), &number),
        Ok(Literal::Integer(-3))
    );
}

#[test]
fn test_number_passes_through() {
    let number = AttributeType::number();
    assert_eq!(
        coerce_literal(&Literal::Integer(7), &number),
        Ok(Literal::Integer(7))
    );
    assert_eq!(
        coerce_literal(&Literal::Float(0.25), &number),
        Ok(Literal::Float(0.25))
    );
}

#[test]
fn test_number_rejects() {
    let number = AttributeType::number();
    for value in [
        Literal::from("abc"),
        Literal::from(""),
        Literal::from("12abc"),
        Literal::Boolean(true),
    ] {
        assert_eq!(
            coerce_literal(&value, &number),
            Err(ExpectedType::Number),
            "{} should not be a number",
            value
        );
    }
}

#[test]
fn test_boolean() {
    let boolean = AttributeType::boolean();
    assert_eq!(
        coerce_literal(&"TRUE".into(), &boolean),
        Ok(Literal::Boolean(true))
    );
    assert_eq!(
        coerce_literal(&"false".into(), &boolean),
        Ok(Literal::Boolean(false))
    );
    assert_eq!(
        coerce_literal(&Literal::Boolean(true), &boolean),
        Ok(Literal::Boolean(true))
    );
    assert_eq!(
        coerce_literal(&"yes".into(), &boolean),
        Err(ExpectedType::Boolean)
    );
    assert_eq!(
        coerce_literal(&Literal::Integer(1), &boolean),
        Err(ExpectedType::Boolean)
    );
}

#[test]
fn test_date() {
    let date = AttributeType::date();
    let coerced = coerce_literal(&"2024-01-31T10:15:30.250Z".into(), &date).unwrap();
    match &coerced {
        Literal::Date(d) => assert_eq!(format_date(d), "2024-01-31T10:15:30.250Z"),
        other => panic!("expected a date, got {:?}", other),
    }
    assert_eq!(coerce_literal(&coerced, &date), Ok(coerced.clone()));

    for value in [
        "2024-01-31",
        "2024-01-31T10:15:30Z",
        "2024-13-01T00:00:00.000Z",
        "yesterday",
    ] {
        assert_eq!(
            coerce_literal(&value.into(), &date),
            Err(ExpectedType::Date),
            "{} should not be a date",
            value
        );
    }
    assert_eq!(
        coerce_literal(&Literal::Integer(1706695200000), &date),
        Err(ExpectedType::Date)
    );
}

#[test]
fn test_string_accepts_anything() {
    let string = AttributeType::string();
    assert_eq!(
        coerce_literal(&Literal::Integer(42), &string),
        Ok(Literal::String("42".into()))
    );
    assert_eq!(
        coerce_literal(&Literal::Boolean(false), &string),
        Ok(Literal::String("false".into()))
    );
    assert_eq!(
        coerce_literal(&"EBK".into(), &string),
        Ok(Literal::String("EBK".into()))
    );
}

#[test]
fn test_unsupported_type() {
    assert_eq!(
        coerce_literal(&"x".into(), &AttributeType::nested()),
        Err(ExpectedType::Unsupported)
    );
    let unknown: AttributeType =
        serde_json::from_value(serde_json::json!({"type": "geo_point"})).unwrap();
    assert_eq!(
        coerce_literal(&"x".into(), &unknown),
        Err(ExpectedType::Unsupported)
    );
}

// ============================================================================
// Rule coercion
// ============================================================================

#[test]
fn test_coerce_rewrites_criteria_only() {
    let rules = vec![
        Rule::begin(),
        Rule::criteria("pages", Relationship::Gt, "300"),
        Rule::and(),
        Rule::criteria_set("drm", Relationship::In, ["true", "FALSE"]),
        Rule::end(),
    ];
    let coerced = coerce(&rules, &schema(), &CompilerConfig::default(), false).unwrap();
    assert_eq!(
        coerced,
        vec![
            Rule::begin(),
            Rule::criteria("pages", Relationship::Gt, 300i64),
            Rule::and(),
            Rule::criteria_set("drm", Relationship::In, [true, false]),
            Rule::end(),
        ]
    );
}

#[test]
fn test_coerce_reports_rule_index() {
    let rules = vec![
        Rule::begin(),
        Rule::criteria("type", Relationship::Eq, "book"),
        Rule::and(),
        Rule::criteria("pages", Relationship::Eq, "many"),
        Rule::end(),
    ];
    match coerce(&rules, &schema(), &CompilerConfig::default(), false) {
        Err(CompileError::Coercion {
            expected,
            attribute,
            value,
            rule,
        }) => {
            assert_eq!(expected, ExpectedType::Number);
            assert_eq!(attribute, "pages");
            assert_eq!(value, Literal::from("many"));
            assert_eq!(rule, 3);
        }
        other => panic!("expected a coercion error, got {:?}", other),
    }
}

#[test]
fn test_exact_match_flag() {
    let config = CompilerConfig::default();
    let rules = vec![
        Rule::begin(),
        Rule::criteria("type", Relationship::Eq, "book"),
        Rule::and(),
        Rule::criteria("_id", Relationship::Eq, "abc"),
        Rule::and(),
        Rule::criteria("title", Relationship::Like, "rust"),
        Rule::and(),
        Rule::criteria("pages", Relationship::Eq, 10i64),
        Rule::and(),
        Rule::criteria("publishedAt", Relationship::Gt, "2024-01-01T00:00:00.000Z"),
        Rule::and(),
        Rule::criteria("title", Relationship::Prefix, "Ru"),
        Rule::end(),
    ];

    let search = coerce(&rules, &schema(), &config, true).unwrap();
    let flags: Vec<bool> = search
        .iter()
        .filter(|r| matches!(r, Rule::Criteria(_)))
        .map(|r| criteria_of(r).exact_match)
        .collect();
    assert_eq!(flags, vec![true, false, false, false, false, true]);

    let document = coerce(&rules, &schema(), &config, false).unwrap();
    assert!(
        document
            .iter()
            .filter(|r| matches!(r, Rule::Criteria(_)))
            .all(|r| !criteria_of(r).exact_match)
    );
}

#[test]
fn test_custom_identity_field_exempt() {
    let config = CompilerConfig {
        identity_field: "type".into(),
        ..Default::default()
    };
    let rules = vec![
        Rule::begin(),
        Rule::criteria("type", Relationship::Eq, "book"),
        Rule::end(),
    ];
    let coerced = coerce(&rules, &schema(), &config, true).unwrap();
    assert!(!criteria_of(&coerced[1]).exact_match);
}

#[test]
fn test_element_filter_attribute() {
    let rules = vec![
        Rule::begin(),
        Rule::criteria("classifications[type:netbase].code", Relationship::Eq, "FIC"),
        Rule::end(),
    ];
    let coerced = coerce(&rules, &schema(), &CompilerConfig::default(), true).unwrap();
    let criteria = criteria_of(&coerced[1]);
    assert_eq!(criteria.attribute, "classifications[type:netbase].code");
    assert!(criteria.exact_match);
}

#[test]
fn test_filter_literal_typed_by_schema() {
    let path = AttributePath::parse("classifications[type:netbase].code").unwrap();
    assert_eq!(
        filter_literal(&path, &schema()),
        Ok(Some(Literal::String("netbase".into())))
    );

    let path = AttributePath::parse("variants[size:10].sku").unwrap();
    assert_eq!(filter_literal(&path, &schema()), Ok(Some(Literal::Integer(10))));

    // No schema entry for the key: kept as a string
    let path = AttributePath::parse("variants[colour:red].sku").unwrap();
    assert_eq!(
        filter_literal(&path, &schema()),
        Ok(Some(Literal::String("red".into())))
    );

    let path = AttributePath::parse("variants.sku").unwrap();
    assert_eq!(filter_literal(&path, &schema()), Ok(None));
}

#[test]
fn test_filter_literal_rejects_mistyped_value() {
    let path = AttributePath::parse("variants[size:large].sku").unwrap();
    assert_eq!(filter_literal(&path, &schema()), Err(ExpectedType::Number));
}

#[test]
fn test_coerce_rejects_mistyped_filter_value() {
    let rules = vec![
        Rule::begin(),
        Rule::criteria("variants[size:large].sku", Relationship::Eq, "A1"),
        Rule::end(),
    ];
    match coerce(&rules, &schema(), &CompilerConfig::default(), false) {
        Err(CompileError::Coercion {
            expected,
            attribute,
            value,
            rule,
        }) => {
            assert_eq!(expected, ExpectedType::Number);
            assert_eq!(attribute, "variants.size");
            assert_eq!(value, Literal::from("large"));
            assert_eq!(rule, 1);
        }
        other => panic!("expected a coercion error, got {:?}", other),
    }
}
