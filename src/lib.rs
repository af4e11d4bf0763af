pub mod ast;
pub mod coercion;
pub mod compiler;
pub mod config;
pub mod document;
pub mod error;
pub mod grouping;
pub mod output;
pub mod parser;
pub mod path;
pub mod schema;
pub mod search;
pub mod validator;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{
    Criteria, LogicalNode, LogicalOp, Node, Operand, QuerySpec, RawRule, Relationship, Rule,
    RuleEntry, RuleGroup, Separator,
};
pub use compiler::{Compiler, DocumentSpec};
pub use config::CompilerConfig;
pub use document::DocumentQuery;
pub use error::{CompileError, EmissionReason, ExpectedType, Result, StructuralReason};
pub use output::{to_json, to_json_pretty};
pub use schema::{AttributeType, PrimitiveType, Schema, SchemaLookup};
pub use search::{BoolQuery, SearchQuery};
pub use value::Literal;
