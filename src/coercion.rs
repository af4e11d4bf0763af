//! Type coercion stage.
//!
//! Rewrites every criteria literal from its wire representation into the
//! type the schema declares for the attribute:
//!
//! | Declared type              | Accepted input                              | Result            |
//! |----------------------------|---------------------------------------------|-------------------|
//! | `number`                   | numbers, numeric strings                    | Integer / Float   |
//! | `boolean`                  | booleans, `"true"`/`"false"` (any case)     | Boolean           |
//! | `string` + `date-time`     | `YYYY-MM-DDTHH:mm:ss.sssZ` strings, dates   | Date              |
//! | `string`                   | anything                                    | String            |
//! | anything else              | nothing                                     | "invalid data type" |
//!
//! Values that already have the declared type pass through untouched, so
//! coercion is idempotent.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use tracing::debug;

use crate::{
    ast::{Criteria, Operand, Rule},
    config::CompilerConfig,
    error::{CompileError, EmissionReason, ExpectedType, Result},
    path::AttributePath,
    schema::{AttributeType, PrimitiveType, SchemaLookup},
    value::Literal,
};

static ISO_DATE: OnceLock<Regex> = OnceLock::new();

fn iso_date_regex() -> &'static Regex {
    ISO_DATE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$").unwrap())
}

const ISO_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Coerce every criteria rule in `rules` against `schema`.
///
/// Separators and logical rules are copied as-is. With `for_search` set,
/// plain string attributes compared by anything but a full-text relationship
/// are flagged for the exact-match suffix, except the identity field.
///
/// # Examples
///
/// ```
/// use rules_query::{coercion, CompilerConfig, Relationship, Rule, Schema, AttributeType, Literal};
///
/// let schema = Schema::new().with("prices.price", AttributeType::number());
/// let rules = vec![
///     Rule::begin(),
///     Rule::criteria("prices.price", Relationship::Gt, "9.5"),
///     Rule::end(),
/// ];
///
/// let coerced = coercion::coerce(&rules, &schema, &CompilerConfig::default(), false).unwrap();
/// assert_eq!(coerced[1], Rule::criteria("prices.price", Relationship::Gt, 9.5));
/// ```
pub fn coerce<S: SchemaLookup + ?Sized>(
    rules: &[Rule],
    schema: &S,
    config: &CompilerConfig,
    for_search: bool,
) -> Result<Vec<Rule>> {
    debug!(rules = rules.len(), for_search, "Coercing rule literals");

    rules
        .iter()
        .enumerate()
        .map(|(index, rule)| match rule {
            Rule::Criteria(criteria) => {
                coerce_criteria(criteria, index, schema, config, for_search).map(Rule::Criteria)
            }
            other => Ok(other.clone()),
        })
        .collect()
}

/// Coerce a single criteria rule; `index` is its position, for diagnostics.
pub fn coerce_criteria<S: SchemaLookup + ?Sized>(
    criteria: &Criteria,
    index: usize,
    schema: &S,
    config: &CompilerConfig,
    for_search: bool,
) -> Result<Criteria> {
    let declared = resolve_attribute(&criteria.attribute, index, schema)?;
    check_filter(criteria, index, schema)?;

    let convert = |value: &Literal| {
        coerce_literal(value, declared).map_err(|expected| CompileError::Coercion {
            expected,
            attribute: criteria.attribute.clone(),
            value: value.clone(),
            rule: index,
        })
    };

    let operand = match &criteria.operand {
        Operand::Value(value) => Operand::Value(convert(value)?),
        Operand::Values(values) => {
            Operand::Values(values.iter().map(convert).collect::<Result<Vec<_>>>()?)
        }
    };

    let exact_match = for_search
        && declared.is_plain_string()
        && !criteria.relationship.is_full_text()
        && criteria.attribute != config.identity_field;

    Ok(Criteria {
        attribute: criteria.attribute.clone(),
        relationship: criteria.relationship,
        operand,
        exact_match,
    })
}

/// Look up the declared type of an attribute, element filter stripped.
pub fn resolve_attribute<'s, S: SchemaLookup + ?Sized>(
    attribute: &str,
    index: usize,
    schema: &'s S,
) -> Result<&'s AttributeType> {
    let schema_path = parse_at(attribute, index)?.schema_path();
    schema
        .lookup(&schema_path)
        .ok_or(CompileError::SchemaResolution {
            attribute: schema_path,
        })
}

fn parse_at(attribute: &str, index: usize) -> Result<AttributePath> {
    AttributePath::parse(attribute).map_err(|e| match e {
        CompileError::Structural { reason, .. } => CompileError::structural_at(reason, index),
        other => other,
    })
}

/// Convert one literal into the declared type.
pub fn coerce_literal(value: &Literal, declared: &AttributeType) -> Result<Literal, ExpectedType> {
    match declared.primitive {
        PrimitiveType::Number => to_number(value).ok_or(ExpectedType::Number),
        PrimitiveType::Boolean => to_boolean(value).ok_or(ExpectedType::Boolean),
        PrimitiveType::String if declared.is_date() => to_date(value).ok_or(ExpectedType::Date),
        PrimitiveType::String => Ok(match value {
            Literal::String(_) => value.clone(),
            other => Literal::String(other.as_string()),
        }),
        PrimitiveType::Object | PrimitiveType::Unknown => Err(ExpectedType::Unsupported),
    }
}

/// Literal for the value inside an element filter (`[type:netbase]`).
///
/// Coerced against the schema entry for `<array>.<key>` when there is one;
/// kept as a string otherwise. `Ok(None)` for paths without a filter.
pub fn filter_literal<S: SchemaLookup + ?Sized>(
    path: &AttributePath,
    schema: &S,
) -> Result<Option<Literal>, ExpectedType> {
    let (Some(array), Some(filter)) = (path.array_path(), path.filter()) else {
        return Ok(None);
    };
    let raw = Literal::String(filter.value.clone());
    match schema.lookup(&format!("{}.{}", array, filter.key)) {
        Some(declared) => coerce_literal(&raw, declared).map(Some),
        None => Ok(Some(raw)),
    }
}

/// [`filter_literal`] for the emitters, which only see coerced rules.
pub(crate) fn emitted_filter<S: SchemaLookup + ?Sized>(
    path: &AttributePath,
    schema: &S,
) -> Result<Option<Literal>> {
    filter_literal(path, schema).map_err(|expected| {
        CompileError::emission(EmissionReason::FilterValue {
            attribute: path.schema_path(),
            expected,
        })
    })
}

/// Check that the element filter of `criteria`, if any, fits its schema type.
pub fn check_filter<S: SchemaLookup + ?Sized>(
    criteria: &Criteria,
    index: usize,
    schema: &S,
) -> Result<()> {
    let path = parse_at(&criteria.attribute, index)?;
    let (Some(array), Some(filter)) = (path.array_path(), path.filter()) else {
        return Ok(());
    };
    filter_literal(&path, schema)
        .map(|_| ())
        .map_err(|expected| CompileError::Coercion {
            expected,
            attribute: format!("{}.{}", array, filter.key),
            value: Literal::String(filter.value.clone()),
            rule: index,
        })
}

fn to_number(value: &Literal) -> Option<Literal> {
    match value {
        Literal::Integer(_) | Literal::Float(_) => Some(value.clone()),
        Literal::String(s) => parse_number(s.trim()),
        Literal::Boolean(_) | Literal::Date(_) => None,
    }
}

fn parse_number(s: &str) -> Option<Literal> {
    let decimal = Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok();

    match decimal {
        // Keep integers as integers when the value is whole
        Some(d) if d.fract().is_zero() => d
            .to_i64()
            .map(Literal::Integer)
            .or_else(|| d.to_f64().map(Literal::Float)),
        Some(d) => d.to_f64().map(Literal::Float),
        None => s
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Literal::Float),
    }
}

fn to_boolean(value: &Literal) -> Option<Literal> {
    match value {
        Literal::Boolean(_) => Some(value.clone()),
        Literal::String(s) if s.eq_ignore_ascii_case("true") => Some(Literal::Boolean(true)),
        Literal::String(s) if s.eq_ignore_ascii_case("false") => Some(Literal::Boolean(false)),
        _ => None,
    }
}

fn to_date(value: &Literal) -> Option<Literal> {
    match value {
        Literal::Date(_) => Some(value.clone()),
        Literal::String(s) if iso_date_regex().is_match(s) => {
            NaiveDateTime::parse_from_str(s, ISO_DATE_FORMAT)
                .ok()
                .map(|naive| Literal::Date(naive.and_utc()))
        }
        _ => None,
    }
}
