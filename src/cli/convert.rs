//! JSON input loading

use super::CliError;
use crate::{CompilerConfig, QuerySpec, Schema};

/// Parse one query spec or an array of them.
///
/// The flag is `true` when the input was a single spec, so the output can
/// keep the same shape.
pub fn parse_specs(json: &str) -> Result<(Vec<QuerySpec>, bool), CliError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    match value {
        serde_json::Value::Array(_) => Ok((serde_json::from_value(value)?, false)),
        single => Ok((vec![serde_json::from_value(single)?], true)),
    }
}

/// Read a schema file: `{"<path>": {"type": ..., "format"?: ..., "array"?: ...}}`.
pub fn load_schema(path: &str) -> Result<Schema, CliError> {
    let content = std::fs::read_to_string(path)?;
    Ok(Schema::from_json_str(&content)?)
}

/// Read a compiler config file; missing keys keep their defaults.
pub fn load_config(path: &str) -> Result<CompilerConfig, CliError> {
    let content = std::fs::read_to_string(path)?;
    Ok(CompilerConfig::from_json_str(&content)?)
}
