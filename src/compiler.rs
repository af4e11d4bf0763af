//! Compilation pipeline.
//!
//! ```text
//! QuerySpec ──flatten──► RawRule[] ──validate──► Rule[] ──coerce──► Rule[]
//!                                                                    │
//!                    document target ◄── linearize + reduce ─────────┤
//!                    search target   ◄── prefix tree + descent ──────┘
//! ```
//!
//! A [`Compiler`] borrows the schema and owns its configuration. It keeps no
//! state between calls, so one instance can serve any number of compiles,
//! from any number of threads when the schema is `Sync`.

use serde::Serialize;
use tracing::debug;

use crate::{
    ast::{
        LogicalOp, QuerySpec, RawRule, Rule, RuleEntry, Separator,
        spec::GROUP_TYPE,
    },
    coercion,
    config::CompilerConfig,
    document::{self, DocumentQuery},
    error::{CompileError, Result, StructuralReason},
    parser,
    schema::SchemaLookup,
    search::{SearchEmitter, SearchQuery, requires_scoring},
    validator,
};

/// Document-store output: the compiled filter replaces `rules`, the other
/// fields pass through.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSpec {
    #[serde(rename = "type")]
    pub product_type: String,

    pub rules: DocumentQuery,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<String>>,
}

/// Rule compiler bound to one schema.
///
/// # Examples
///
/// ```
/// use rules_query::{AttributeType, Compiler, QuerySpec, RawRule, Schema};
/// use serde_json::json;
///
/// let schema = Schema::new()
///     .with("prices", AttributeType::nested())
///     .with("prices.price", AttributeType::number())
///     .with("prices.currency", AttributeType::string());
///
/// let rules: Vec<RawRule> = serde_json::from_value(json!([
///     {"type": "separator", "value": "BEGIN"},
///     {"type": "criteria", "attribute": "prices.price", "relationship": "EQ", "value": "100"},
///     {"type": "logical", "value": "AND"},
///     {"type": "criteria", "attribute": "prices.currency", "relationship": "EQ", "value": "GBP"},
///     {"type": "separator", "value": "END"}
/// ])).unwrap();
///
/// let compiler = Compiler::new(&schema);
/// let compiled = compiler.compile_document(&QuerySpec::new("book", rules)).unwrap();
///
/// assert_eq!(
///     serde_json::to_value(&compiled).unwrap(),
///     json!({
///         "type": "book",
///         "rules": {"prices": {"$elemMatch": {"$and": [
///             {"price": {"$eq": 100}},
///             {"currency": {"$eq": "GBP"}}
///         ]}}}
///     })
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Compiler<'a, S: ?Sized> {
    schema: &'a S,
    config: CompilerConfig,
}

impl<'a, S: SchemaLookup + ?Sized> Compiler<'a, S> {
    pub fn new(schema: &'a S) -> Self {
        Self::with_config(schema, CompilerConfig::default())
    }

    pub fn with_config(schema: &'a S, config: CompilerConfig) -> Self {
        Compiler { schema, config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Validate and coerce a spec without emitting anything.
    ///
    /// Returns the coerced rules.
    pub fn validate(&self, spec: &QuerySpec) -> Result<Vec<Rule>> {
        let raw = flatten(&spec.rules)?;
        let rules = validator::validate_raw(&raw, self.schema)?;
        coercion::coerce(&rules, self.schema, &self.config, false)
    }

    pub fn compile_document(&self, spec: &QuerySpec) -> Result<DocumentSpec> {
        debug!(product_type = %spec.product_type, "Compiling document query");
        let raw = flatten(&spec.rules)?;
        let rules = validator::validate_raw(&raw, self.schema)?;
        Ok(DocumentSpec {
            product_type: spec.product_type.clone(),
            rules: self.emit_document(&rules)?,
            attributes: spec.attributes.clone(),
        })
    }

    /// Compile already typed rules for the document store.
    pub fn compile_document_rules(&self, rules: &[Rule]) -> Result<DocumentQuery> {
        validator::validate(rules, self.schema)?;
        self.emit_document(rules)
    }

    pub fn compile_search(&self, spec: &QuerySpec) -> Result<SearchQuery> {
        debug!(product_type = %spec.product_type, "Compiling search query");
        let raw = flatten(&spec.rules)?;
        let rules = validator::validate_raw(&raw, self.schema)?;
        self.emit_search(&rules)
    }

    /// Compile already typed rules for the search engine.
    pub fn compile_search_rules(&self, rules: &[Rule]) -> Result<SearchQuery> {
        validator::validate(rules, self.schema)?;
        self.emit_search(rules)
    }

    /// Compile every spec for the document store, in order.
    pub fn compile_document_specs(&self, specs: &[QuerySpec]) -> Result<Vec<DocumentSpec>> {
        specs.iter().map(|spec| self.compile_document(spec)).collect()
    }

    /// Compile every spec for the search engine, in order.
    pub fn compile_search_specs(&self, specs: &[QuerySpec]) -> Result<Vec<SearchQuery>> {
        specs.iter().map(|spec| self.compile_search(spec)).collect()
    }

    fn emit_document(&self, rules: &[Rule]) -> Result<DocumentQuery> {
        let coerced = coercion::coerce(rules, self.schema, &self.config, false)?;
        document::emit(&coerced, self.schema)
    }

    fn emit_search(&self, rules: &[Rule]) -> Result<SearchQuery> {
        let coerced = coercion::coerce(rules, self.schema, &self.config, true)?;
        let scoring = requires_scoring(&coerced);
        let tree = parser::build(&coerced)?;
        SearchEmitter::new(self.schema, &self.config, scoring).emit(&tree)
    }
}

/// Turn spec entries into one plain rule sequence.
///
/// Plain rules are returned as they are. Named groups are each wrapped in
/// `BEGIN .. END`, joined by `AND`, and wrapped once more:
///
/// ```text
/// [g1, g2]  ->  BEGIN BEGIN <g1> END AND BEGIN <g2> END END
/// ```
pub fn flatten(entries: &[RuleEntry]) -> Result<Vec<RawRule>> {
    let groups = entries
        .iter()
        .filter(|entry| matches!(entry, RuleEntry::Group(_)))
        .count();

    if groups == 0 {
        return Ok(entries
            .iter()
            .filter_map(|entry| match entry {
                RuleEntry::Rule(rule) => Some(rule.clone()),
                RuleEntry::Group(_) => None,
            })
            .collect());
    }
    if groups != entries.len() {
        return Err(CompileError::structural(StructuralReason::MixedGroupedRules));
    }

    let mut flat = vec![RawRule::separator(Separator::Begin)];
    for (position, entry) in entries.iter().enumerate() {
        let RuleEntry::Group(group) = entry else {
            continue;
        };
        if group.kind != GROUP_TYPE {
            return Err(CompileError::structural(StructuralReason::InvalidGroupEntry(
                group.name.clone(),
            )));
        }
        if position > 0 {
            flat.push(RawRule::logical(LogicalOp::And));
        }
        flat.push(RawRule::separator(Separator::Begin));
        flat.extend(group.rules.iter().cloned());
        flat.push(RawRule::separator(Separator::End));
    }
    flat.push(RawRule::separator(Separator::End));

    debug!(groups, rules = flat.len(), "Flattened rule groups");
    Ok(flat)
}
