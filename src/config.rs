//! Compiler configuration.
//!
//! # Example
//!
//! ```
//! use rules_query::CompilerConfig;
//!
//! // Defaults
//! let config = CompilerConfig::default();
//! assert_eq!(config.identity_field, "_id");
//! assert_eq!(config.keyword_suffix, ".keyword");
//!
//! // Overridden
//! let config = CompilerConfig {
//!     keyword_suffix: ".raw".into(),
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

/// Settings shared by the coercion stage and the search emitter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompilerConfig {
    /// Document identity field; never given the exact-match suffix
    #[serde(default = "default_identity_field")]
    pub identity_field: String,

    /// Suffix addressing the exact-match sub-field of a plain string
    /// attribute in the search index
    #[serde(default = "default_keyword_suffix")]
    pub keyword_suffix: String,
}

fn default_identity_field() -> String {
    "_id".to_string()
}

fn default_keyword_suffix() -> String {
    ".keyword".to_string()
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            identity_field: default_identity_field(),
            keyword_suffix: default_keyword_suffix(),
        }
    }
}

impl CompilerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
