//! Rule validator.
//!
//! Checks, in order:
//!
//! 1. the sequence is non-empty
//! 2. every rule has a known `type`
//! 3. separators are `BEGIN`/`END`, logicals are `AND`/`OR`, relationships are known
//! 4. scalar relationships carry one `value`, set relationships a non-empty `values`
//! 5. every attribute resolves against the schema
//! 6. every literal coerces to the attribute's declared type
//! 7. the rules are in a legal order (see [`check_order`])
//!
//! The first violation is returned as an error.

use std::str::FromStr;

use tracing::debug;

use crate::{
    ast::{
        Criteria, LogicalOp, Operand, RawRule, Relationship, Rule, Separator,
        tokens::{CRITERIA_TYPE, LOGICAL_TYPE, SEPARATOR_TYPE},
    },
    coercion::{check_filter, coerce_literal, resolve_attribute},
    error::{CompileError, Result, StructuralReason},
    schema::SchemaLookup,
    value::Literal,
};

/// Decode wire rules into typed rules and run every check against `schema`.
pub fn validate_raw<S: SchemaLookup + ?Sized>(raw: &[RawRule], schema: &S) -> Result<Vec<Rule>> {
    let rules = decode(raw)?;
    validate(&rules, schema)?;
    Ok(rules)
}

/// Run checks 1 and 4 through 7 on already typed rules.
pub fn validate<S: SchemaLookup + ?Sized>(rules: &[Rule], schema: &S) -> Result<()> {
    if rules.is_empty() {
        return Err(CompileError::structural(StructuralReason::EmptyRules));
    }

    for (index, rule) in rules.iter().enumerate() {
        if let Rule::Criteria(criteria) = rule {
            check_operand(criteria, index)?;
            check_literals(criteria, index, schema)?;
        }
    }

    check_order(rules)?;
    debug!(rules = rules.len(), "Rules validated");
    Ok(())
}

/// Checks 1 through 4: turn wire rules into typed rules.
pub fn decode(raw: &[RawRule]) -> Result<Vec<Rule>> {
    if raw.is_empty() {
        return Err(CompileError::structural(StructuralReason::EmptyRules));
    }
    raw.iter()
        .enumerate()
        .map(|(index, rule)| decode_rule(rule, index))
        .collect()
}

fn decode_rule(raw: &RawRule, index: usize) -> Result<Rule> {
    let fail = |reason| CompileError::structural_at(reason, index);

    match raw.kind.as_deref() {
        Some(SEPARATOR_TYPE) => Separator::from_str(&text_value(raw))
            .map(Rule::Separator)
            .map_err(|v| fail(StructuralReason::InvalidSeparator(v))),
        Some(LOGICAL_TYPE) => LogicalOp::from_str(&text_value(raw))
            .map(Rule::Logical)
            .map_err(|v| fail(StructuralReason::InvalidLogical(v))),
        Some(CRITERIA_TYPE) => decode_criteria(raw, index).map(Rule::Criteria),
        other => Err(fail(StructuralReason::UnknownRuleType(
            other.unwrap_or_default().to_string(),
        ))),
    }
}

fn text_value(raw: &RawRule) -> String {
    match &raw.value {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn decode_criteria(raw: &RawRule, index: usize) -> Result<Criteria> {
    let fail = |reason| CompileError::structural_at(reason, index);

    let attribute = raw
        .attribute
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .ok_or_else(|| fail(StructuralReason::MissingAttribute))?;

    let relationship_name = raw.relationship.as_deref().unwrap_or_default();
    let relationship = Relationship::from_str(relationship_name)
        .map_err(|r| fail(StructuralReason::UnknownRelationship(r)))?;

    let shape_error = || {
        fail(StructuralReason::ValueShape {
            relationship: relationship.to_string(),
            expects_set: relationship.is_set(),
        })
    };

    // `null` counts as absent
    let value = raw.value.as_ref().filter(|v| !v.is_null());
    let values = raw.values.as_ref().filter(|v| !v.is_null());

    let operand = match (relationship.is_set(), value, values) {
        (true, None, Some(serde_json::Value::Array(items))) if !items.is_empty() => {
            let literals = items
                .iter()
                .map(Literal::from_json)
                .collect::<Option<Vec<_>>>()
                .ok_or_else(shape_error)?;
            Operand::Values(literals)
        }
        (false, Some(value), None) => {
            Operand::Value(Literal::from_json(value).ok_or_else(shape_error)?)
        }
        _ => return Err(shape_error()),
    };

    Ok(Criteria::new(attribute, relationship, operand))
}

fn check_operand(criteria: &Criteria, index: usize) -> Result<()> {
    let well_formed = match &criteria.operand {
        Operand::Value(_) => !criteria.relationship.is_set(),
        Operand::Values(values) => criteria.relationship.is_set() && !values.is_empty(),
    };
    if well_formed {
        Ok(())
    } else {
        Err(CompileError::structural_at(
            StructuralReason::ValueShape {
                relationship: criteria.relationship.to_string(),
                expects_set: criteria.relationship.is_set(),
            },
            index,
        ))
    }
}

fn check_literals<S: SchemaLookup + ?Sized>(
    criteria: &Criteria,
    index: usize,
    schema: &S,
) -> Result<()> {
    let declared = resolve_attribute(&criteria.attribute, index, schema)?;
    for value in criteria.operand.literals() {
        coerce_literal(value, declared).map_err(|expected| CompileError::Coercion {
            expected,
            attribute: criteria.attribute.clone(),
            value: value.clone(),
            rule: index,
        })?;
    }
    check_filter(criteria, index, schema)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Begin,
    Logical,
    Criteria,
}

/// Replay the sequence on a stack of markers.
///
/// - `BEGIN` follows nothing, `BEGIN`, or a logical
/// - `END` follows `BEGIN` or a criteria, and pops back to its `BEGIN`; a
///   closed group that sits inside another one counts as a criteria
/// - a logical follows a criteria or `BEGIN`
/// - a criteria follows `BEGIN` or a logical
///
/// The stack must be empty at the end.
pub fn check_order(rules: &[Rule]) -> Result<()> {
    let mut stack: Vec<Marker> = Vec::new();
    let improper = |index| CompileError::structural_at(StructuralReason::ImproperOrder, index);

    for (index, rule) in rules.iter().enumerate() {
        let top = stack.last().copied();
        match rule {
            Rule::Separator(Separator::Begin) => match top {
                None | Some(Marker::Begin) | Some(Marker::Logical) => stack.push(Marker::Begin),
                _ => return Err(improper(index)),
            },
            Rule::Separator(Separator::End) => match top {
                Some(Marker::Begin) | Some(Marker::Criteria) => {
                    let mut closed = false;
                    while let Some(marker) = stack.pop() {
                        if marker == Marker::Begin {
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(improper(index));
                    }
                    if !stack.is_empty() {
                        stack.push(Marker::Criteria);
                    }
                }
                _ => return Err(improper(index)),
            },
            Rule::Logical(_) => match top {
                Some(Marker::Criteria) | Some(Marker::Begin) => stack.push(Marker::Logical),
                _ => return Err(improper(index)),
            },
            Rule::Criteria(_) => match top {
                Some(Marker::Begin) | Some(Marker::Logical) => stack.push(Marker::Criteria),
                _ => return Err(improper(index)),
            },
        }
    }

    if stack.is_empty() {
        Ok(())
    } else {
        Err(CompileError::structural(StructuralReason::ImproperOrder))
    }
}
