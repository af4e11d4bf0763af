//! Attribute schema lookup.
//!
//! The compiler never owns schema data. It asks a [`SchemaLookup`] for the
//! declared type of a dotted path (element filters already stripped) and
//! treats a missing entry as an unknown attribute.
//!
//! [`Schema`] is a map-backed implementation that loads from JSON:
//!
//! ```text
//! {
//!   "type":             {"type": "string"},
//!   "prices":           {"type": "object", "array": true},
//!   "prices.price":     {"type": "number"},
//!   "prices.currency":  {"type": "string"},
//!   "publishedAt":      {"type": "string", "format": "date-time"}
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::path;

pub const DATE_TIME_FORMAT: &str = "date-time";

/// Declared type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveType {
    String,
    Number,
    Boolean,
    /// Sub-document; array-valued objects are nested fields
    Object,
    /// Anything the compiler does not know how to compare against
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeType {
    #[serde(rename = "type")]
    pub primitive: PrimitiveType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(rename = "array", default)]
    pub array_valued: bool,
}

impl AttributeType {
    pub fn new(primitive: PrimitiveType) -> Self {
        AttributeType {
            primitive,
            format: None,
            array_valued: false,
        }
    }

    pub fn string() -> Self {
        Self::new(PrimitiveType::String)
    }

    pub fn number() -> Self {
        Self::new(PrimitiveType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(PrimitiveType::Boolean)
    }

    pub fn date() -> Self {
        AttributeType {
            format: Some(DATE_TIME_FORMAT.to_string()),
            ..Self::string()
        }
    }

    /// Array of sub-documents.
    pub fn nested() -> Self {
        Self::new(PrimitiveType::Object).array()
    }

    pub fn array(mut self) -> Self {
        self.array_valued = true;
        self
    }

    /// A string carrying the `date-time` format annotation.
    pub fn is_date(&self) -> bool {
        self.primitive == PrimitiveType::String && self.format.as_deref() == Some(DATE_TIME_FORMAT)
    }

    /// Plain string without a date annotation.
    pub fn is_plain_string(&self) -> bool {
        self.primitive == PrimitiveType::String && !self.is_date()
    }

    /// Array of sub-documents, which the search backend indexes as `nested`.
    pub fn is_nested(&self) -> bool {
        self.array_valued && self.primitive == PrimitiveType::Object
    }
}

/// Read-only attribute type lookup.
pub trait SchemaLookup {
    /// Declared type of `path`, which never contains an element filter.
    fn lookup(&self, path: &str) -> Option<&AttributeType>;

    /// Nested ancestors of `path`, outermost first.
    fn nested_ancestors(&self, path: &str) -> Vec<String> {
        let mut found: Vec<String> = path::ancestors(path)
            .filter(|ancestor| self.lookup(ancestor).is_some_and(AttributeType::is_nested))
            .map(str::to_string)
            .collect();
        found.reverse();
        found
    }
}

/// Map-backed schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    attributes: HashMap<String, AttributeType>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, path: impl Into<String>, attribute: AttributeType) -> Self {
        self.insert(path, attribute);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, attribute: AttributeType) {
        self.attributes.insert(path.into(), attribute);
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl SchemaLookup for Schema {
    fn lookup(&self, path: &str) -> Option<&AttributeType> {
        self.attributes.get(path)
    }
}

impl<S: SchemaLookup + ?Sized> SchemaLookup for &S {
    fn lookup(&self, path: &str) -> Option<&AttributeType> {
        (**self).lookup(path)
    }
}
