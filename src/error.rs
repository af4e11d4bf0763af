//! Errors raised while validating, coercing, or compiling a rule sequence.
//!
//! Every failure mode stems from invalid input, so nothing here is
//! retryable. Callers usually map any [`CompileError`] to a 400-class
//! "invalid filter expression" response.

use thiserror::Error;

use crate::value::Literal;

/// Shorthand result type for the compiler.
pub type Result<T, E = CompileError> = std::result::Result<T, E>;

/// Errors that can occur while compiling a rule sequence.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Malformed token shape, illegal ordering, or ambiguous grouping.
    #[error("{reason}{}", at_rule(.rule))]
    Structural {
        reason: StructuralReason,
        /// Index of the offending rule within the sequence, when known.
        rule: Option<usize>,
    },

    /// The attribute (with any element filter stripped) has no schema entry.
    #[error("attribute '{attribute}' is not defined in the schema")]
    SchemaResolution { attribute: String },

    /// A literal could not be converted to the attribute's declared type.
    #[error("{expected} (attribute '{attribute}', value {value}, rule {rule})")]
    Coercion {
        expected: ExpectedType,
        attribute: String,
        value: Literal,
        rule: usize,
    },

    /// The emitter reached a shape it cannot turn into a query.
    #[error("{reason}")]
    Emission { reason: EmissionReason },

    /// Wire-level decoding failure.
    #[error("invalid rule document: {0}")]
    Json(#[from] serde_json::Error),
}

fn at_rule(rule: &Option<usize>) -> String {
    match rule {
        Some(index) => format!(" (rule {})", index),
        None => String::new(),
    }
}

impl CompileError {
    pub(crate) fn structural(reason: StructuralReason) -> Self {
        CompileError::Structural { reason, rule: None }
    }

    pub(crate) fn structural_at(reason: StructuralReason, rule: usize) -> Self {
        CompileError::Structural {
            reason,
            rule: Some(rule),
        }
    }

    pub(crate) fn emission(reason: EmissionReason) -> Self {
        CompileError::Emission { reason }
    }
}

/// What exactly was wrong with the shape or order of the rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralReason {
    EmptyRules,
    UnknownRuleType(String),
    InvalidSeparator(String),
    InvalidLogical(String),
    UnknownRelationship(String),
    MissingAttribute,
    /// A scalar relationship without a single value, or a set relationship
    /// without a non-empty list of values.
    ValueShape { relationship: String, expects_set: bool },
    ImproperOrder,
    MixedLogicalOperators,
    UnbalancedSeparators,
    MultipleRoots,
    MixedGroupedRules,
    InvalidGroupEntry(String),
    InvalidPath(String),
}

impl std::fmt::Display for StructuralReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use StructuralReason::*;
        match self {
            EmptyRules => write!(f, "rules must be a non-empty list"),
            UnknownRuleType(t) => write!(f, "unknown rule type '{}'", t),
            InvalidSeparator(v) => write!(f, "invalid separator value '{}', expected BEGIN or END", v),
            InvalidLogical(v) => write!(f, "invalid logical value '{}', expected AND or OR", v),
            UnknownRelationship(r) => write!(f, "unknown relationship '{}'", r),
            MissingAttribute => write!(f, "criteria rule is missing its attribute"),
            ValueShape {
                relationship,
                expects_set: true,
            } => write!(f, "relationship {} requires a non-empty 'values' list", relationship),
            ValueShape {
                relationship,
                expects_set: false,
            } => write!(f, "relationship {} requires a single non-null 'value'", relationship),
            ImproperOrder => write!(f, "rules are not in proper order"),
            MixedLogicalOperators => {
                write!(f, "multiple logical operators between a single query clause")
            }
            UnbalancedSeparators => write!(f, "unbalanced BEGIN/END separators"),
            MultipleRoots => write!(f, "rules must form a single top-level group"),
            MixedGroupedRules => write!(f, "grouped and ungrouped rules cannot be mixed"),
            InvalidGroupEntry(name) => write!(f, "rule group '{}' must have type 'group'", name),
            InvalidPath(path) => write!(f, "invalid attribute path '{}'", path),
        }
    }
}

/// The canonical type a coercion was aiming for when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedType {
    Number,
    Boolean,
    Date,
    /// The schema declares a type that cannot be compared against.
    Unsupported,
}

impl std::fmt::Display for ExpectedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpectedType::Number => write!(f, "invalid value, a number value is expected"),
            ExpectedType::Boolean => write!(f, "invalid value, a boolean value is expected"),
            ExpectedType::Date => write!(f, "invalid value, a date value is expected"),
            ExpectedType::Unsupported => write!(f, "invalid data type"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmissionReason {
    /// The reduced template was neither a single clause nor empty.
    MalformedTemplate,
    /// A group joined by AND/OR resolved to fewer than two clauses.
    MinimumCriteria,
    /// A relationship with no leaf form in the target.
    UnsupportedRelationship(String),
    /// A scalar relationship holding a list, or a set relationship holding
    /// a single value.
    OperandShape(String),
    /// An element filter value that does not fit the type of `<array>.<key>`.
    FilterValue {
        attribute: String,
        expected: ExpectedType,
    },
}

impl std::fmt::Display for EmissionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmissionReason::MalformedTemplate => write!(f, "malformed rule expression"),
            EmissionReason::MinimumCriteria => {
                write!(f, "logical operation needs minimum 2 criteria")
            }
            EmissionReason::UnsupportedRelationship(r) => {
                write!(f, "unsupported operator '{}'", r)
            }
            EmissionReason::OperandShape(r) => {
                write!(f, "operand does not fit relationship {}", r)
            }
            EmissionReason::FilterValue {
                attribute,
                expected,
            } => write!(f, "{} (element filter on '{}')", expected, attribute),
        }
    }
}
