//! Compile query specs read as JSON

use super::{CliError, parse_specs};
use crate::{Compiler, CompilerConfig, Schema};

/// Which backend to compile for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Target {
    /// MongoDB-style filter documents
    #[default]
    Document,
    /// Elasticsearch bool queries
    Search,
}

/// Options for the compile command
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Attribute schema the rules are checked against
    pub schema: Schema,
    /// JSON input string: one query spec or an array of them
    pub input: Option<String>,
    pub target: Target,
    pub config: CompilerConfig,
    /// Only validate and coerce, don't emit
    pub validate_only: bool,
}

/// Result of a compile operation
#[derive(Debug)]
pub enum CompileResult {
    /// Every spec passed validation; carries the number of specs checked
    Valid(usize),
    /// Compiled output, an array when the input was an array
    Success(serde_json::Value),
}

/// Execute a compile operation
pub fn execute_compile(options: &CompileOptions) -> Result<CompileResult, CliError> {
    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let (specs, single) = parse_specs(json_str)?;

    let compiler = Compiler::with_config(&options.schema, options.config.clone());

    if options.validate_only {
        for spec in &specs {
            compiler.validate(spec)?;
        }
        return Ok(CompileResult::Valid(specs.len()));
    }

    let mut outputs = match options.target {
        Target::Document => compiler
            .compile_document_specs(&specs)?
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?,
        Target::Search => compiler
            .compile_search_specs(&specs)?
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?,
    };

    let output = match (single, outputs.len()) {
        (true, 1) => outputs.remove(0),
        _ => serde_json::Value::Array(outputs),
    };
    Ok(CompileResult::Success(output))
}
