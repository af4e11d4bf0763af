//! # Product Rules - Abstract Syntax Tree
//!
//! This module defines the data model of the rules compiler: the flat rule
//! sequence a caller sends, and the prefix tree it is compiled through.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Wire rules (`RawRule`) and validated rules (`Rule`)
//! - **[operators]** - Relationships, connectives, separators, polarity table
//! - **[tree]** - Prefix tree nodes produced by the tree builder
//! - **[spec]** - Query specifications, optionally split into named groups
//!
//! ## Quick Start
//!
//! A rule sequence is infix notation with explicit grouping markers:
//!
//! ```text
//! BEGIN  type EQ "book"  AND  book.format EQ "EBK"  END
//! ```
//!
//! ## Core Concepts
//!
//! ### Grouping
//!
//! `BEGIN`/`END` stand in for parentheses. Every sequence is wrapped in one
//! top-level group, and a group may only use one connective:
//!
//! ```text
//! BEGIN a EQ 1 AND BEGIN b EQ 2 OR c EQ 3 END END   // ok
//! BEGIN a EQ 1 AND b EQ 2 OR c EQ 3 END             // rejected
//! ```
//!
//! ### Attribute Paths
//!
//! Attributes are dotted paths. One segment may carry an element filter
//! selecting the array element whose sub-field equals a value:
//!
//! ```text
//! classifications[type:netbase].code
//! ```
//!
//! ### Relationships
//!
//! Scalar relationships (`EQ NE GT LT GE LE LIKE PREFIX`) take `value`;
//! set relationships (`IN NI ALL`) take a non-empty `values` list.
pub mod operators;
pub mod spec;
pub mod tokens;
pub mod tree;

pub use operators::{LogicalOp, POLARITY, Polarity, Relationship, Separator};
pub use spec::{QuerySpec, RuleEntry, RuleGroup};
pub use tokens::{Criteria, Operand, RawRule, Rule};
pub use tree::{LogicalNode, Node};
